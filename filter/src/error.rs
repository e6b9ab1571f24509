#[derive(Debug)]
pub enum Error {
    Input(String),
    Parse(String),
    Send(sibmail::Error),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Input(ref msg) => write!(f, "unable to read email: {}", msg),
            Error::Parse(ref msg) => write!(f, "unable to parse email: {}", msg),
            Error::Send(ref e) => write!(f, "{}", e),
        }
    }
}

impl From<sibmail::Error> for Error {
    fn from(err: sibmail::Error) -> Self {
        Self::Send(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Input(err.to_string())
    }
}

impl From<mailparse::MailParseError> for Error {
    fn from(err: mailparse::MailParseError) -> Self {
        Self::Parse(err.to_string())
    }
}
