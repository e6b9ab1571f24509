use serde::Serialize;
use serde_json::{Map, Value};

use super::{value_string, ApiVersion, Draft, Headers, RawResponse, RequestBody, SendResult, VersionStrategy};
use crate::address::{Address, Recipients};
use crate::attachment::ResolvedAttachments;

/// Expected status of a successful v3 send
pub const STATUS_CREATED: u16 = 201;

/// A v3 sender or recipient
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Contact {
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl From<Address> for Contact {
    fn from(address: Address) -> Self {
        Self {
            email: address.address,
            name: address.name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum V3Attachment {
    Remote {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Generated { name: String, content: String },
}

/// v3 request body
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct V3Body {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<Contact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<Contact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Vec<Contact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<u64>,
    pub headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Vec<V3Attachment>>,
}

fn contacts(recipients: Option<Recipients>) -> Option<Vec<Contact>> {
    recipients.map(|r| r.iter().cloned().map(Contact::from).collect())
}

fn attachments(resolved: ResolvedAttachments) -> Vec<V3Attachment> {
    match resolved {
        ResolvedAttachments::Remote(remote) => remote
            .into_iter()
            .map(|r| V3Attachment::Remote {
                url: r.url,
                name: r.filename,
            })
            .collect(),
        ResolvedAttachments::Generated(map) => map
            .iter()
            .map(|(name, content)| V3Attachment::Generated {
                name: name.to_string(),
                content: content.to_string(),
            })
            .collect(),
    }
}

/// v3 schema: `{email, name}` contacts, templating through `templateId`
/// and `params`, `201` on success with a top-level `messageId`.
#[derive(Debug)]
pub struct V3Strategy;

impl VersionStrategy for V3Strategy {
    fn version(&self) -> ApiVersion {
        ApiVersion::V3
    }

    fn adapt_body(&self, draft: Draft) -> RequestBody {
        // Templated sends take their content from the template
        let templated = draft.params.is_some() || draft.template_id.is_some();
        let (text_content, html_content) = if templated {
            (None, None)
        } else {
            (draft.text, draft.html)
        };

        RequestBody::V3(V3Body {
            sender: draft.from.map(Contact::from),
            to: contacts(draft.to),
            cc: contacts(draft.cc),
            bcc: contacts(draft.bcc),
            reply_to: draft.reply_to.map(Contact::from),
            subject: draft.subject,
            text_content,
            html_content,
            params: draft.params,
            template_id: draft.template_id,
            headers: draft.headers,
            attachment: draft.attachment.map(attachments),
        })
    }

    fn is_success(&self, response: &RawResponse) -> bool {
        response.status == STATUS_CREATED
    }

    fn extract_result(&self, response: RawResponse) -> SendResult {
        let message_id = response
            .body
            .get("messageId")
            .and_then(value_string)
            .unwrap_or_default();

        SendResult {
            message_id,
            code: None,
            message: None,
            raw: response,
        }
    }
}
