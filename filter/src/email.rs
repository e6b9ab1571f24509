use bytes::Bytes;
use mailparse::{DispositionType, MailHeaderMap, ParsedMail};

use sibmail::{Attachment, Content, Message};

use crate::error::Error;

/// Inspect part headers to determine if this is an attachment.
/// If it is, build the Attachment and return it.
fn attachment_from_mime(part: &ParsedMail) -> Option<Attachment> {
    if part.headers.get_first_value("Content-Disposition").is_none() {
        // Not an attachment
        return None;
    }

    let disposition = part.get_content_disposition();

    // If the content disposition is inline AND MIME is text,
    // likely not an attachment...
    match disposition.disposition {
        DispositionType::Inline if part.ctype.mimetype.starts_with("text/") => return None,
        DispositionType::Inline | DispositionType::Attachment => (),
        ref other => {
            log::error!("Invalid Content-Disposition type: {:?}", other);
            return None;
        }
    }

    let data = match part.get_body_raw() {
        Ok(body) => body,
        Err(e) => {
            log::error!("Attachment body not found: {}", e);
            return None;
        }
    };

    // A missing name is left for the transport to report
    let filename = disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .cloned();

    Some(Attachment {
        filename,
        content: Some(Content::Bytes(Bytes::from(data))),
        ..Default::default()
    })
}

/// Recursively walk the MIME parts and extract the following:
///
/// 1. Body (text and/or html)
/// 2. Attachments, inline ones included
///
fn parse_recursive(message: &mut Message, part: &ParsedMail) -> Result<(), Error> {
    let mimetype = &part.ctype.mimetype;

    // If this is an attachment, append to Vec and return
    if let Some(attachment) = attachment_from_mime(part) {
        message.attachments.push(attachment);
        return Ok(());
    }

    // Email body, first of each kind wins
    if mimetype.starts_with("text/") {
        let body = part.get_body()?;

        if mimetype.ends_with("plain") && message.text.is_none() {
            message.text = Some(body);
        } else if mimetype.ends_with("html") && message.html.is_none() {
            message.html = Some(body);
        }

        return Ok(());
    }

    // Multipart -> process each subpart recursively
    if mimetype.starts_with("multipart/") {
        for subpart in part.subparts.iter() {
            if let Err(e) = parse_recursive(message, subpart) {
                log::warn!("Skipping unreadable MIME part: {}", e);
            }
        }
    }

    Ok(())
}

/// Convert a raw MIME email into a message for the API.
///
/// The envelope decides who receives the mail: `recipients` become `to` and
/// the `Cc` header is not forwarded, so nobody is mailed twice. The `From`
/// header is preferred over the envelope sender for its display name.
pub fn from_mime(mime_content: &[u8], sender: String, recipients: Vec<String>) -> Result<Message, Error> {
    let parsed = mailparse::parse_mail(mime_content)?;
    let headers = &parsed.headers;

    let mut message = Message::new()
        .with_sender(headers.get_first_value("From").unwrap_or(sender))
        .with_recipients(recipients);

    message.subject = headers.get_first_value("Subject");
    message.reply_to = headers.get_first_value("Reply-To").map(Into::into);

    parse_recursive(&mut message, &parsed)?;

    Ok(message)
}
