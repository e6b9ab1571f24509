use serde::Deserialize;

use crate::Error;

pub const DEFAULT_PATH: &str = "/etc/sibmail/sibmail.toml";
const ENV_PREFIX: &str = "SIBMAIL";

/// Legacy endpoint used when no `api_url` is configured
pub const DEFAULT_API_URL: &str = "https://api.sendinblue.com/v2.0";

// Request timeout, in seconds
pub(crate) const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// What to do when a message's attachments cannot be resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentPolicy {
    /// Send the message without its attachments and log a warning
    Omit,
    /// Abort the send with a build error
    Fail,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        AttachmentPolicy::Omit
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Settings {
    pub api_key: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub on_attachment_error: AttachmentPolicy,

    /// Seconds before an API request is abandoned
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

impl Settings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: default_api_url(),
            on_attachment_error: AttachmentPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_attachment_policy(mut self, policy: AttachmentPolicy) -> Self {
        self.on_attachment_error = policy;
        self
    }

    /// Checks required values and returns the parsed endpoint URL
    pub fn validate(&self) -> Result<url::Url, Error> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config(
                "apiKey: must be a non-empty string".to_string(),
            ));
        }

        if self.api_url.trim().is_empty() {
            return Err(Error::Config(
                "apiUrl: must be a non-empty string".to_string(),
            ));
        }

        Ok(url::Url::parse(self.api_url.trim())?)
    }
}

/// Loads settings from a TOML file and merges them with any environment
/// variables prefixed with SIBMAIL_ (`SIBMAIL_API_KEY`, `SIBMAIL_API_URL`, ...).
///
/// The default file is optional; an explicitly passed path must exist.
pub fn load_settings(path: Option<&str>) -> Result<Settings, Error> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path.unwrap_or(DEFAULT_PATH)).required(path.is_some()))
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()?
        .try_deserialize::<Settings>()?;

    settings.validate()?;

    Ok(settings)
}
