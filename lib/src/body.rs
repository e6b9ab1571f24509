use crate::address;
use crate::attachment;
use crate::compliance::{Draft, Headers, RequestBody, VersionStrategy};
use crate::config::AttachmentPolicy;
use crate::email::Message;
use crate::Error;

/// Builds the request body of a single message.
///
/// Address errors always fail the build. Attachment errors fail it only
/// under `AttachmentPolicy::Fail`; with `Omit` the message goes out without
/// any of its attachments.
pub struct BodyBuilder<'a> {
    strategy: &'a dyn VersionStrategy,
    base_headers: &'a Headers,
    policy: AttachmentPolicy,
}

impl<'a> BodyBuilder<'a> {
    pub fn new(
        strategy: &'a dyn VersionStrategy,
        base_headers: &'a Headers,
        policy: AttachmentPolicy,
    ) -> Self {
        Self {
            strategy,
            base_headers,
            policy,
        }
    }

    pub async fn build(&self, message: Message) -> Result<RequestBody, Error> {
        let Message {
            from,
            to,
            cc,
            bcc,
            reply_to,
            subject,
            text,
            html,
            headers,
            attachments,
            params,
            template_id,
        } = message;

        let mut draft = Draft {
            from: address::normalize_one(from.as_ref())?,
            to: address::normalize_many(to.as_ref())?,
            cc: address::normalize_many(cc.as_ref())?,
            bcc: address::normalize_many(bcc.as_ref())?,
            reply_to: address::normalize_one(reply_to.as_ref())?,
            subject,
            text,
            html,
            headers: if headers.is_empty() {
                self.base_headers.clone()
            } else {
                headers
            },
            attachment: None,
            params,
            template_id,
        };

        if attachments.is_empty() {
            return Ok(self.strategy.adapt_body(draft));
        }

        let count = attachments.len();
        match attachment::resolve(attachments).await {
            Ok(resolved) => draft.attachment = Some(resolved),
            Err(e) => match self.policy {
                AttachmentPolicy::Fail => return Err(e),
                AttachmentPolicy::Omit => {
                    log::warn!(
                        "Sending without {} attachment(s), resolution failed: {}",
                        count,
                        e
                    );
                }
            },
        }

        Ok(self.strategy.adapt_body(draft))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::compliance::ApiVersion;
    use crate::Attachment;

    fn base_headers() -> Headers {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers
    }

    async fn build(version: ApiVersion, policy: AttachmentPolicy, message: Message) -> Result<Value, Error> {
        let headers = base_headers();
        let builder = BodyBuilder::new(version.strategy(), &headers, policy);
        let body = builder.build(message).await?;
        Ok(serde_json::to_value(body).unwrap())
    }

    fn mixed_attachments(message: Message) -> Message {
        message
            .with_attachment(Attachment::remote("a.pdf", "https://files.test.net/a.pdf"))
            .with_attachment(Attachment::from_text("b.txt", "hello"))
    }

    #[tokio::test]
    async fn fills_out_all_address_fields() {
        let message = Message::new()
            .with_sender("example@test.net")
            .with_recipients("example@test.net")
            .with_cc("example@test.net")
            .with_bcc("example@test.net")
            .with_reply_to("example@test.net");

        let body = build(ApiVersion::V2, AttachmentPolicy::Omit, message)
            .await
            .unwrap();

        assert_eq!(body["from"], json!(["example@test.net", ""]));
        assert_eq!(body["to"], json!({"example@test.net": ""}));
        assert_eq!(body["cc"], json!({"example@test.net": ""}));
        assert_eq!(body["bcc"], json!({"example@test.net": ""}));
        assert_eq!(body["replyto"], json!(["example@test.net", ""]));
    }

    #[tokio::test]
    async fn absent_fields_are_omitted() {
        let message = Message::new()
            .with_sender("example@test.net")
            .with_recipients("to@test.net");

        let body = build(ApiVersion::V2, AttachmentPolicy::Omit, message)
            .await
            .unwrap();

        assert!(body.get("cc").is_none());
        assert!(body.get("bcc").is_none());
        assert!(body.get("replyto").is_none());
        assert!(body.get("attachment").is_none());
    }

    #[tokio::test]
    async fn headers_default_to_base_headers() {
        let plain = Message::new().with_sender("example@test.net");
        let custom = Message::new()
            .with_sender("example@test.net")
            .with_header("X-Mailin-Tag", "welcome");

        let plain = build(ApiVersion::V2, AttachmentPolicy::Omit, plain)
            .await
            .unwrap();
        let custom = build(ApiVersion::V2, AttachmentPolicy::Omit, custom)
            .await
            .unwrap();

        assert_eq!(plain["headers"], json!({"Accept": "application/json"}));
        assert_eq!(custom["headers"], json!({"X-Mailin-Tag": "welcome"}));
    }

    #[tokio::test]
    async fn resolved_attachments_are_attached() {
        let message = Message::new()
            .with_sender("example@test.net")
            .with_attachment(Attachment::from_text("hello.txt", "hello"));

        let body = build(ApiVersion::V2, AttachmentPolicy::Omit, message)
            .await
            .unwrap();

        assert_eq!(body["attachment"], json!({"hello.txt": "aGVsbG8="}));
    }

    // Attachment failures are silently dropped under the default policy:
    // the message still goes out, without any attachment.
    #[tokio::test]
    async fn attachment_errors_are_dropped_by_default() {
        let message = mixed_attachments(Message::new().with_sender("example@test.net"));

        let body = build(ApiVersion::V2, AttachmentPolicy::Omit, message)
            .await
            .unwrap();

        assert!(body.get("attachment").is_none());
        assert_eq!(body["from"], json!(["example@test.net", ""]));
    }

    #[tokio::test]
    async fn attachment_errors_fail_when_configured() {
        let message = mixed_attachments(Message::new().with_sender("example@test.net"));

        let result = build(ApiVersion::V2, AttachmentPolicy::Fail, message).await;

        assert!(matches!(result, Err(Error::MixedAttachmentTypes)));
    }

    #[tokio::test]
    async fn address_errors_are_never_dropped() {
        let message = Message::new()
            .with_sender(crate::Address::new("", "Nobody"))
            .with_attachment(Attachment::from_text("hello.txt", "hello"));

        let result = build(ApiVersion::V2, AttachmentPolicy::Omit, message).await;

        assert!(matches!(result, Err(Error::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn builds_v3_bodies() {
        let message = Message::new()
            .with_sender(r#""Doe, Jon" <example@test.net>"#)
            .with_recipients(vec!["example@test.net", r#""Don, Joe" <example2@test.net>"#])
            .with_subject("Hello")
            .with_text("Hi")
            .with_attachment(Attachment::remote("a.pdf", "https://files.test.net/a.pdf"));

        let body = build(ApiVersion::V3, AttachmentPolicy::Omit, message)
            .await
            .unwrap();

        assert_eq!(
            body["sender"],
            json!({"email": "example@test.net", "name": "Doe, Jon"})
        );
        assert_eq!(
            body["to"],
            json!([
                {"email": "example@test.net"},
                {"email": "example2@test.net", "name": "Don, Joe"}
            ])
        );
        assert_eq!(body["textContent"], json!("Hi"));
        assert_eq!(
            body["attachment"],
            json!([{"url": "https://files.test.net/a.pdf", "name": "a.pdf"}])
        );
        assert!(body.get("from").is_none());
    }
}
