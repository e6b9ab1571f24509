use sibmail::SendResult;

use crate::error::Error;

// See sysexits.h
pub const TEMPFAIL: i32 = 75;
pub const UNAVAILABLE: i32 = 69;

/// Enhanced status code reported to Postfix for a permanent failure.
/// `None` means the failure is temporary and delivery should be retried.
///
/// See: https://www.iana.org/assignments/smtp-enhanced-status-codes/smtp-enhanced-status-codes.xhtml
pub fn status_code(err: &Error) -> Option<&'static str> {
    match err {
        Error::Input(_) => None,
        Error::Parse(_) => Some("5.6.0"),
        Error::Send(e) if e.is_temporary() => None,
        Error::Send(sibmail::Error::Config(_)) => None,
        Error::Send(sibmail::Error::Build(inner)) => match **inner {
            sibmail::Error::InvalidAddress(_) => Some("5.1.3"),
            _ => Some("5.6.0"),
        },
        Error::Send(sibmail::Error::Remote { status, .. }) if *status == 401 || *status == 403 => {
            Some("5.7.8")
        }
        Error::Send(_) => Some("5.3.0"),
    }
}

/// Report a failed delivery and return the filter's exit code
pub fn reply_error(err: Error) -> i32 {
    match status_code(&err) {
        Some(code) => {
            // Postfix includes stdout in the bounce
            println!("{}: {}", code, err);
            UNAVAILABLE
        }
        None => {
            // Temporary failure: tell Postfix to retry delivery of this email.
            log::warn!("Deferring email: {}", err);
            TEMPFAIL
        }
    }
}

pub fn reply_success(result: &SendResult) -> i32 {
    log::info!("Email relayed with Message-ID {}", result.message_id);
    0
}
