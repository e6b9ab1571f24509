//! Outgoing message as handed over by the mail-sending framework.
//!
//! Address fields accept any `Addresses` shape. Nothing is validated until
//! the message is sent.
use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::address::Addresses;
use crate::attachment::Attachment;

#[derive(Debug, Default)]
pub struct Message {
    pub from: Option<Addresses>,
    pub to: Option<Addresses>,
    pub cc: Option<Addresses>,
    pub bcc: Option<Addresses>,
    pub reply_to: Option<Addresses>,
    pub subject: Option<String>,

    /// Plaintext body
    pub text: Option<String>,

    /// HTML body, if any
    pub html: Option<String>,

    /// Custom headers. When empty, the transport's base headers are sent.
    pub headers: BTreeMap<String, String>,

    pub attachments: Vec<Attachment>,

    /// Template parameters (v3 only)
    pub params: Option<Map<String, Value>>,

    /// Template identifier (v3 only)
    pub template_id: Option<u64>,
}

impl Message {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_sender(mut self, from: impl Into<Addresses>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_recipients(mut self, to: impl Into<Addresses>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn with_cc(mut self, cc: impl Into<Addresses>) -> Self {
        self.cc = Some(cc.into());
        self
    }

    pub fn with_bcc(mut self, bcc: impl Into<Addresses>) -> Self {
        self.bcc = Some(bcc.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<Addresses>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_template(mut self, template_id: u64) -> Self {
        self.template_id = Some(template_id);
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }
}
