//! API generation handling.
//!
//! The endpoint URL decides which generation of the API we talk to. Each
//! generation is a `VersionStrategy`: it shapes the request body and
//! interprets the response. The strategy is picked once per `Transport`.
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::address::{Address, Recipients};
use crate::attachment::ResolvedAttachments;
use crate::Error;

mod legacy;
mod v3;

pub use legacy::{LegacyBody, LegacyStrategy};
pub use v3::{Contact, V3Attachment, V3Body, V3Strategy};

pub type Headers = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    V2,
    V3,
}

impl ApiVersion {
    /// Find the first `v<digit>` segment of the endpoint path (`/v2.0`,
    /// `/v3`, ...). Endpoints without one are treated as legacy.
    pub fn detect(endpoint: &Url) -> Self {
        let digit = endpoint.path_segments().and_then(|mut segments| {
            segments.find_map(|segment| {
                let mut chars = segment.chars();
                match (chars.next(), chars.next()) {
                    (Some('v'), Some(d)) | (Some('V'), Some(d)) => d.to_digit(10),
                    _ => None,
                }
            })
        });

        match digit {
            Some(3) => ApiVersion::V3,
            Some(2) | None => ApiVersion::V2,
            Some(other) => {
                log::warn!(
                    "Unknown API version v{} in {}, using the legacy schema",
                    other,
                    endpoint
                );
                ApiVersion::V2
            }
        }
    }

    pub fn strategy(self) -> &'static dyn VersionStrategy {
        match self {
            ApiVersion::V2 => &LegacyStrategy,
            ApiVersion::V3 => &V3Strategy,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ApiVersion::V2 => f.write_str("v2"),
            ApiVersion::V3 => f.write_str("v3"),
        }
    }
}

/// Version-independent request body, as produced by the body builder
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Draft {
    pub from: Option<Address>,
    pub to: Option<Recipients>,
    pub cc: Option<Recipients>,
    pub bcc: Option<Recipients>,
    pub reply_to: Option<Address>,
    pub subject: Option<String>,
    pub text: Option<String>,
    pub html: Option<String>,
    pub headers: Headers,
    pub attachment: Option<ResolvedAttachments>,
    pub params: Option<Map<String, Value>>,
    pub template_id: Option<u64>,
}

/// JSON body sent to the `/email` endpoint
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    Legacy(LegacyBody),
    V3(V3Body),
}

/// HTTP status and parsed body of an API response.
/// Bodies that are not JSON objects are replaced by `{}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn parse(status: u16, body: &[u8]) -> Self {
        let body = match serde_json::from_slice::<Value>(body) {
            Ok(v @ Value::Object(_)) => v,
            _ => Value::Object(Map::new()),
        };

        Self { status, body }
    }

    /// Field of the body rendered as a string, if present and scalar
    pub fn field(&self, key: &str) -> Option<String> {
        value_string(self.body.get(key)?)
    }
}

pub(crate) fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub message_id: String,

    /// Legacy API only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Legacy API only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip)]
    pub raw: RawResponse,
}

/// Schema of one API generation
pub trait VersionStrategy: fmt::Debug + Send + Sync {
    fn version(&self) -> ApiVersion;

    /// Turn the version-independent draft into this generation's body
    fn adapt_body(&self, draft: Draft) -> RequestBody;

    fn is_success(&self, response: &RawResponse) -> bool;

    fn extract_result(&self, response: RawResponse) -> SendResult;

    /// Error for a response that failed `is_success`
    fn remote_error(&self, response: &RawResponse) -> Error {
        Error::Remote {
            message: response
                .field("message")
                .unwrap_or_else(|| "server error".to_string()),
            code: response.field("code").unwrap_or_else(|| "-".to_string()),
            status: response.status,
        }
    }
}
