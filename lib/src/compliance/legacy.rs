use serde::Serialize;

use super::{value_string, ApiVersion, Draft, Headers, RawResponse, RequestBody, SendResult, VersionStrategy};
use crate::address::Recipients;
use crate::attachment::ResolvedAttachments;

/// Expected status of a successful legacy send
pub const STATUS_OK: u16 = 200;

/// Legacy (v2) request body
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegacyBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Recipients>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<Recipients>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Recipients>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replyto: Option<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<ResolvedAttachments>,
}

/// v2 schema: `[address, name]` senders, address -> name recipient maps,
/// `200` + `code: "success"` on success, message id under `data`.
#[derive(Debug)]
pub struct LegacyStrategy;

impl VersionStrategy for LegacyStrategy {
    fn version(&self) -> ApiVersion {
        ApiVersion::V2
    }

    fn adapt_body(&self, draft: Draft) -> RequestBody {
        let pair = |a: crate::Address| (a.address, a.name);

        RequestBody::Legacy(LegacyBody {
            from: draft.from.map(pair),
            to: draft.to,
            cc: draft.cc,
            bcc: draft.bcc,
            replyto: draft.reply_to.map(pair),
            subject: draft.subject,
            text: draft.text,
            html: draft.html,
            headers: draft.headers,
            attachment: draft.attachment,
        })
    }

    /// The legacy API also reports some failures as `200` with a
    /// non-success `code` in the body.
    fn is_success(&self, response: &RawResponse) -> bool {
        if response.status != STATUS_OK {
            return false;
        }

        match response.field("code") {
            Some(code) => code == "success",
            None => true,
        }
    }

    fn extract_result(&self, response: RawResponse) -> SendResult {
        let message_id = response
            .body
            .get("data")
            .and_then(|data| data.get("message-id"))
            .and_then(value_string)
            .unwrap_or_default();

        SendResult {
            message_id,
            code: response.field("code"),
            message: response.field("message"),
            raw: response,
        }
    }
}
