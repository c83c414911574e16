use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A configuration error occurred.
    Config(String),
    /// Credential acquisition failed (missing environment or rejected by the
    /// identity provider).
    Auth(String),
    /// A completion request failed in transport or came back non-success.
    Request {
        model: String,
        status: Option<u16>,
        details: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {msg}"),
            Error::Auth(msg) => write!(f, "Authentication error: {msg}"),
            Error::Request {
                model,
                status,
                details,
            } => match status {
                Some(code) => write!(f, "Request error ({model}, HTTP {code}): {details}"),
                None => write!(f, "Request error ({model}): {details}"),
            },
        }
    }
}

impl std::error::Error for Error {}
