use std::fmt;

use reqwest::StatusCode;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Transport failure (connectivity, DNS, abort). Never retried here.
    Http(reqwest::Error),
    Config(String),
    /// A 401 was returned to a request that carried no credential.
    AuthenticationRequired,
    /// A 401 was returned and the refresh exchange could not replace the credential.
    SessionExpired,
    Status(StatusCode, String),
    Auth(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::Json(err) => write!(f, "json error: {}", err),
            Error::Http(err) => write!(f, "http error: {}", err),
            Error::Config(msg) => write!(f, "config error: {}", msg),
            Error::AuthenticationRequired => write!(f, "Authentication required. Please login."),
            Error::SessionExpired => write!(f, "Session expired. Please login again."),
            Error::Status(status, body) => write!(f, "unexpected status {}: {}", status, body),
            Error::Auth(msg) => write!(f, "auth error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}
