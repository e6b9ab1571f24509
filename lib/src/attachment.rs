use std::fmt;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::{Bytes, BytesMut};
use futures::future;
use futures::stream::{Stream, TryStreamExt};
use serde::ser::{Serialize, Serializer};

use crate::Error;

/// Readable byte stream, drained fully before encoding
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

/// Inline attachment content
pub enum Content {
    Text(String),
    Bytes(Bytes),
    Stream(ByteStream),
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Content::Text(ref s) => write!(f, "Text({} chars)", s.len()),
            Content::Bytes(ref b) => write!(f, "Bytes({} bytes)", b.len()),
            Content::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// A single attachment as handed over by the caller.
///
/// Exactly one source is used, in this order: `href`/`url` (remote),
/// `path`, then `content`. `raw` attachments are not supported.
#[derive(Debug, Default)]
pub struct Attachment {
    pub filename: Option<String>,
    pub href: Option<String>,
    pub url: Option<String>,
    pub path: Option<PathBuf>,
    pub content: Option<Content>,

    /// Encoding of string content. `base64` content is passed through.
    pub encoding: Option<String>,

    /// Pre-built MIME entity
    pub raw: Option<String>,
}

impl Attachment {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn remote(filename: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            href: Some(href.into()),
            ..Default::default()
        }
    }

    pub fn from_path(filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            filename: Some(filename.into()),
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn from_text(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            content: Some(Content::Text(content.into())),
            ..Default::default()
        }
    }

    pub fn from_bytes(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: Some(filename.into()),
            content: Some(Content::Bytes(content.into())),
            ..Default::default()
        }
    }

    pub fn from_stream(filename: impl Into<String>, stream: ByteStream) -> Self {
        Self {
            filename: Some(filename.into()),
            content: Some(Content::Stream(stream)),
            ..Default::default()
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

/// Filename -> base64 content, in declaration order.
/// A repeated filename replaces the earlier content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratedMap(Vec<(String, String)>);

impl GeneratedMap {
    pub fn insert(&mut self, filename: String, content: String) {
        match self.0.iter_mut().find(|(name, _)| *name == filename) {
            Some(existing) => existing.1 = content,
            None => self.0.push((filename, content)),
        }
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, content)| content.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for GeneratedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// An attachment the API fetches itself. Serializes as its bare URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteAttachment {
    pub url: String,
    pub filename: Option<String>,
}

impl RemoteAttachment {
    pub fn new(url: impl Into<String>, filename: Option<String>) -> Self {
        Self {
            url: url.into(),
            filename,
        }
    }
}

impl Serialize for RemoteAttachment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url)
    }
}

/// Outcome of attachment resolution. A batch is either all remote URLs or
/// all inline base64 content, never both.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum ResolvedAttachments {
    Remote(Vec<RemoteAttachment>),
    Generated(GeneratedMap),
}

enum Source {
    Path(PathBuf),
    Text(String, Option<String>),
    Bytes(Bytes),
    Stream(ByteStream),
}

fn encode_text(content: String, encoding: Option<&str>) -> Result<String, Error> {
    let encoding = encoding.map(|e| e.to_ascii_lowercase());

    match encoding.as_deref() {
        Some("base64") => Ok(content),
        None | Some("utf8") | Some("utf-8") => Ok(STANDARD.encode(content.as_bytes())),
        Some("hex") => {
            let bytes = hex::decode(content.trim()).map_err(|e| {
                Error::InvalidAttachmentFormat(format!("invalid hex content: {}", e))
            })?;
            Ok(STANDARD.encode(&bytes))
        }
        // One byte per code point, upper bits dropped
        Some("binary") | Some("latin1") | Some("ascii") => {
            let bytes: Vec<u8> = content.chars().map(|c| c as u32 as u8).collect();
            Ok(STANDARD.encode(&bytes))
        }
        Some(other) => Err(Error::InvalidAttachmentFormat(format!(
            "unsupported content encoding: {}",
            other
        ))),
    }
}

async fn generate(filename: String, source: Source) -> Result<(String, String), Error> {
    let encoded = match source {
        Source::Path(path) => {
            // Runs on tokio's blocking pool: dropping this future does not
            // cancel a read that has already started.
            let data = tokio::fs::read(&path)
                .await
                .map_err(|e| Error::AttachmentRead(format!("{}: {}", path.display(), e)))?;
            STANDARD.encode(&data)
        }
        Source::Text(content, encoding) => encode_text(content, encoding.as_deref())?,
        Source::Bytes(bytes) => STANDARD.encode(&bytes),
        Source::Stream(mut stream) => {
            let mut buf = BytesMut::new();
            while let Some(chunk) = stream.try_next().await? {
                buf.extend_from_slice(&chunk);
            }
            STANDARD.encode(&buf)
        }
    };

    log::debug!("Generated attachment {} ({} base64 chars)", filename, encoded.len());

    Ok((filename, encoded))
}

/// Resolve all attachments of one message.
///
/// Every attachment is validated in order before any I/O starts, so the
/// first invalid or mixed attachment is the one reported. Local files and
/// streams are then read concurrently. On the first read failure the
/// remaining reads are dropped.
pub async fn resolve(attachments: Vec<Attachment>) -> Result<ResolvedAttachments, Error> {
    let mut remote = Vec::new();
    let mut pending = Vec::new();

    for attachment in attachments {
        if attachment.raw.is_some() {
            return Err(Error::UnsupportedAttachment(
                "raw attachments not supported".to_string(),
            ));
        }

        if let Some(href) = attachment.href.or(attachment.url) {
            if !pending.is_empty() {
                return Err(Error::MixedAttachmentTypes);
            }
            let filename = attachment.filename.filter(|f| !f.is_empty());
            remote.push(RemoteAttachment::new(href, filename));
            continue;
        }

        if !remote.is_empty() {
            return Err(Error::MixedAttachmentTypes);
        }

        let filename = match attachment.filename {
            Some(f) if !f.is_empty() => f,
            _ => return Err(Error::MissingFilename),
        };

        let source = if let Some(path) = attachment.path {
            Source::Path(path)
        } else {
            match attachment.content {
                Some(Content::Text(s)) => Source::Text(s, attachment.encoding),
                Some(Content::Bytes(b)) => Source::Bytes(b),
                Some(Content::Stream(s)) => Source::Stream(s),
                None => {
                    return Err(Error::InvalidAttachmentFormat(format!(
                        "{}: one of href, url, path or content must be set",
                        filename
                    )))
                }
            }
        };

        pending.push(generate(filename, source));
    }

    if !remote.is_empty() {
        return Ok(ResolvedAttachments::Remote(remote));
    }

    let mut generated = GeneratedMap::default();
    for (filename, content) in future::try_join_all(pending).await? {
        generated.insert(filename, content);
    }

    Ok(ResolvedAttachments::Generated(generated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(resolved: ResolvedAttachments) -> GeneratedMap {
        match resolved {
            ResolvedAttachments::Generated(map) => map,
            other => panic!("expected generated attachments, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn remote_attachments_keep_order() {
        let resolved = resolve(vec![
            Attachment::remote("a.pdf", "https://files.test.net/a.pdf"),
            Attachment {
                filename: Some("b.pdf".to_string()),
                url: Some("https://files.test.net/b.pdf".to_string()),
                ..Default::default()
            },
        ])
        .await
        .unwrap();

        assert_eq!(
            resolved,
            ResolvedAttachments::Remote(vec![
                RemoteAttachment::new("https://files.test.net/a.pdf", Some("a.pdf".to_string())),
                RemoteAttachment::new("https://files.test.net/b.pdf", Some("b.pdf".to_string())),
            ])
        );
        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            serde_json::json!(["https://files.test.net/a.pdf", "https://files.test.net/b.pdf"])
        );
    }

    #[tokio::test]
    async fn remote_attachment_filename_is_optional() {
        let resolved = resolve(vec![Attachment {
            href: Some("https://files.test.net/a.pdf".to_string()),
            ..Default::default()
        }])
        .await
        .unwrap();

        assert_eq!(
            resolved,
            ResolvedAttachments::Remote(vec![RemoteAttachment::new(
                "https://files.test.net/a.pdf",
                None
            )])
        );
    }

    #[tokio::test]
    async fn remote_then_local_is_mixed() {
        let result = resolve(vec![
            Attachment::remote("a.pdf", "https://files.test.net/a.pdf"),
            Attachment::from_path("b.pdf", "/does/not/matter.pdf"),
        ])
        .await;

        assert!(matches!(result, Err(Error::MixedAttachmentTypes)));
    }

    #[tokio::test]
    async fn local_then_remote_is_mixed() {
        let result = resolve(vec![
            Attachment::from_path("b.pdf", "/does/not/matter.pdf"),
            Attachment::remote("a.pdf", "https://files.test.net/a.pdf"),
        ])
        .await;

        assert!(matches!(result, Err(Error::MixedAttachmentTypes)));
    }

    #[tokio::test]
    async fn first_violation_is_reported() {
        let result = resolve(vec![
            Attachment::from_text("", "hello"),
            Attachment::remote("a.pdf", "https://files.test.net/a.pdf"),
        ])
        .await;

        assert!(matches!(result, Err(Error::MissingFilename)));
    }

    #[tokio::test]
    async fn raw_attachments_are_rejected() {
        let result = resolve(vec![Attachment {
            raw: Some("Content-Type: text/plain\r\n\r\nhello".to_string()),
            ..Default::default()
        }])
        .await;

        assert!(matches!(result, Err(Error::UnsupportedAttachment(_))));
    }

    #[tokio::test]
    async fn generated_attachment_needs_filename() {
        let result = resolve(vec![Attachment {
            content: Some(Content::Text("hello".to_string())),
            ..Default::default()
        }])
        .await;

        assert!(matches!(result, Err(Error::MissingFilename)));
    }

    #[tokio::test]
    async fn generated_attachment_needs_content() {
        let result = resolve(vec![Attachment {
            filename: Some("empty.txt".to_string()),
            ..Default::default()
        }])
        .await;

        assert!(matches!(result, Err(Error::InvalidAttachmentFormat(_))));
    }

    #[tokio::test]
    async fn text_content_is_encoded() {
        let map = generated(
            resolve(vec![
                Attachment::from_text("hello.txt", "hello"),
                Attachment::from_text("already.txt", "aGVsbG8=").with_encoding("base64"),
                Attachment::from_text("latin.txt", "caf\u{e9}").with_encoding("latin1"),
            ])
            .await
            .unwrap(),
        );

        assert_eq!(map.get("hello.txt"), Some("aGVsbG8="));
        assert_eq!(map.get("already.txt"), Some("aGVsbG8="));
        assert_eq!(map.get("latin.txt"), Some("Y2Fm6Q=="));
    }

    #[tokio::test]
    async fn hex_and_ascii_content_is_decoded() {
        let map = generated(
            resolve(vec![
                Attachment::from_text("a.txt", "68656c6c6f").with_encoding("hex"),
                Attachment::from_text("b.txt", "hello").with_encoding("ascii"),
            ])
            .await
            .unwrap(),
        );

        assert_eq!(map.get("a.txt"), Some("aGVsbG8="));
        assert_eq!(map.get("b.txt"), Some("aGVsbG8="));
    }

    #[tokio::test]
    async fn invalid_hex_content_is_rejected() {
        let result =
            resolve(vec![Attachment::from_text("a.txt", "6g").with_encoding("hex")]).await;

        assert!(matches!(result, Err(Error::InvalidAttachmentFormat(_))));
    }

    #[tokio::test]
    async fn unknown_text_encoding_is_rejected() {
        let result =
            resolve(vec![Attachment::from_text("a.txt", "68656c6c6f").with_encoding("ebcdic")]).await;

        assert!(matches!(result, Err(Error::InvalidAttachmentFormat(_))));
    }

    #[tokio::test]
    async fn bytes_and_streams_are_encoded() {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"hel")),
            Ok(Bytes::from_static(b"lo")),
        ];

        let map = generated(
            resolve(vec![
                Attachment::from_bytes("bytes.bin", Bytes::from_static(b"hello")),
                Attachment::from_stream("stream.bin", Box::pin(futures::stream::iter(chunks))),
            ])
            .await
            .unwrap(),
        );

        let names: Vec<_> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["bytes.bin", "stream.bin"]);
        assert_eq!(map.get("bytes.bin"), Some("aGVsbG8="));
        assert_eq!(map.get("stream.bin"), Some("aGVsbG8="));
    }

    #[tokio::test]
    async fn stream_errors_fail_resolution() {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"hel")),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
        ];

        let result = resolve(vec![Attachment::from_stream(
            "stream.bin",
            Box::pin(futures::stream::iter(chunks)),
        )])
        .await;

        assert!(matches!(result, Err(Error::AttachmentRead(_))));
    }

    #[tokio::test]
    async fn local_files_are_read() {
        let path = std::env::temp_dir().join(format!("sibmail-attachment-{}.txt", std::process::id()));
        tokio::fs::write(&path, b"hello").await.unwrap();

        let map = generated(
            resolve(vec![Attachment::from_path("hello.txt", path.clone())])
                .await
                .unwrap(),
        );
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(map.get("hello.txt"), Some("aGVsbG8="));
    }

    #[tokio::test]
    async fn missing_local_file_fails() {
        let result = resolve(vec![Attachment::from_path(
            "missing.txt",
            "/nonexistent/sibmail/missing.txt",
        )])
        .await;

        assert!(matches!(result, Err(Error::AttachmentRead(_))));
    }

    #[test]
    fn generated_map_serializes_as_object() {
        let mut map = GeneratedMap::default();
        map.insert("a.txt".to_string(), "YQ==".to_string());
        map.insert("a.txt".to_string(), "Yg==".to_string());

        assert_eq!(
            serde_json::to_value(&map).unwrap(),
            serde_json::json!({"a.txt": "Yg=="})
        );
    }
}
