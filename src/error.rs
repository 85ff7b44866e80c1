use std::fmt;

/// Errors that can occur while adapting an exchange to a web context.
///
/// Missing request data (parameters, headers, cookies, attributes) is never an
/// error: those lookups return `None`. An `Error` is only produced when an input
/// cannot be represented on the exchange or a collaborator fails.
///
/// # Examples
///
/// ```
/// use webcontext_core::{Error, ErrorKind};
///
/// let error = Error::with_message(ErrorKind::InvalidHeader, "bad header name");
/// assert_eq!(error.kind(), ErrorKind::InvalidHeader);
/// assert_eq!(error.to_string(), "invalid header: bad header name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
}

impl Error {
    /// Creates a new error with the specified kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a new error with a custom message.
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            write!(f, "{}: {}", self.kind, msg)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl std::error::Error for Error {}

/// The kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value could not be encoded for storage on the exchange.
    Serialization,
    /// A stored value could not be decoded back into the requested type.
    Deserialization,
    /// The exchange carries no session manager or session config.
    SessionUnavailable,
    /// A header name or value is not valid HTTP.
    InvalidHeader,
    /// A status code is outside the range HTTP allows.
    InvalidStatus,
    /// A cookie name, value or attribute cannot be written to `Set-Cookie`.
    InvalidCookie,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialization => write!(f, "serialization failed"),
            Self::Deserialization => write!(f, "deserialization failed"),
            Self::SessionUnavailable => write!(f, "session unavailable"),
            Self::InvalidHeader => write!(f, "invalid header"),
            Self::InvalidStatus => write!(f, "invalid status code"),
            Self::InvalidCookie => write!(f, "invalid cookie"),
        }
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(e: http::header::InvalidHeaderName) -> Self {
        Error::with_message(ErrorKind::InvalidHeader, e.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(e: http::header::InvalidHeaderValue) -> Self {
        Error::with_message(ErrorKind::InvalidHeader, e.to_string())
    }
}

impl From<http::status::InvalidStatusCode> for Error {
    fn from(e: http::status::InvalidStatusCode) -> Self {
        Error::with_message(ErrorKind::InvalidStatus, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_message() {
        let error = Error::new(ErrorKind::SessionUnavailable);
        assert_eq!(error.to_string(), "session unavailable");
        assert!(error.message().is_none());
    }

    #[test]
    fn display_with_message() {
        let error = Error::with_message(ErrorKind::Serialization, "key must be a string");
        assert_eq!(
            error.to_string(),
            "serialization failed: key must be a string"
        );
    }

    #[test]
    fn converts_http_header_errors() {
        let name_err = http::HeaderName::from_bytes(b"bad header").unwrap_err();
        let error: Error = name_err.into();
        assert_eq!(error.kind(), ErrorKind::InvalidHeader);

        let value_err = http::HeaderValue::from_str("line\nbreak").unwrap_err();
        let error: Error = value_err.into();
        assert_eq!(error.kind(), ErrorKind::InvalidHeader);
    }

    #[test]
    fn converts_status_errors() {
        let status_err = http::StatusCode::from_u16(42).unwrap_err();
        let error: Error = status_err.into();
        assert_eq!(error.kind(), ErrorKind::InvalidStatus);
    }
}
