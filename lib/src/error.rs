use std::error;
use std::fmt;

/// All possible sibmail errors.
///
/// Address errors abort a send. Attachment errors are either dropped or
/// raised depending on the configured `AttachmentPolicy`.
#[derive(Debug)]
pub enum Error {
    Config(String),
    InvalidAddress(String),
    MissingFilename,
    InvalidAttachmentFormat(String),
    MixedAttachmentTypes,
    UnsupportedAttachment(String),
    AttachmentRead(String),
    Encode(String),
    Build(Box<Error>),
    Transport(String),
    Remote {
        message: String,
        code: String,
        status: u16,
    },
}

impl Error {
    /// Wraps an error raised while building the request body
    pub fn build(err: Error) -> Self {
        match err {
            Error::Build(_) => err,
            e => Error::Build(Box::new(e)),
        }
    }

    /// Errors worth retrying later: network failures, rate limiting and
    /// server-side failures.
    pub fn is_temporary(&self) -> bool {
        match *self {
            Error::Transport(_) => true,
            Error::Remote { status, .. } => status == 429 || status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Config(ref msg) => write!(f, "invalid configuration: {}", msg),
            Error::InvalidAddress(ref msg) => write!(f, "invalid address: {}", msg),
            Error::MissingFilename => f.write_str("missing filename for attachment"),
            Error::InvalidAttachmentFormat(ref msg) => {
                write!(f, "invalid attachment format: {}", msg)
            }
            Error::MixedAttachmentTypes => f.write_str("mixed remote and generated attachments"),
            Error::UnsupportedAttachment(ref msg) => {
                write!(f, "unsupported attachment: {}", msg)
            }
            Error::AttachmentRead(ref msg) => write!(f, "unable to read attachment: {}", msg),
            Error::Encode(ref msg) => write!(f, "unable to encode body: {}", msg),
            Error::Build(ref e) => write!(f, "unable to build body: {}", e),
            Error::Transport(ref msg) => write!(f, "error sending request: {}", msg),
            Error::Remote {
                ref message,
                ref code,
                status,
            } => write!(f, "{} ({}, {})", message, code, status),
        }
    }
}

impl error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("apiUrl: {}", err))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::AttachmentRead(err.to_string())
    }
}

impl From<mailparse::MailParseError> for Error {
    fn from(err: mailparse::MailParseError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_message() {
        let err = Error::Remote {
            message: "bad key".to_string(),
            code: "failure".to_string(),
            status: 200,
        };

        assert_eq!(err.to_string(), "bad key (failure, 200)");
        assert!(!err.is_temporary());
    }

    #[test]
    fn build_errors_are_prefixed_once() {
        let err = Error::build(Error::build(Error::MixedAttachmentTypes));

        assert_eq!(
            err.to_string(),
            "unable to build body: mixed remote and generated attachments"
        );
    }

    #[test]
    fn temporary_errors() {
        assert!(Error::Transport("connection refused".into()).is_temporary());
        assert!(Error::Remote {
            message: "slow down".into(),
            code: "-".into(),
            status: 429,
        }
        .is_temporary());
        assert!(!Error::InvalidAddress("x".into()).is_temporary());
    }
}
