//! Error kinds shared by the parser, body reader, and router.
//!
//! Errors carry a kind tag and map to an HTTP status via [`ErrorKind::status`]; they do not
//! double as response prototypes themselves — the router's error-handler table
//! ([`crate::router::Router::on_error`]) is what turns an [`Error`] into a
//! [`Response`](crate::response::Response).

use crate::status::StatusCode;

/// Semantic error kind, independent of where in the pipeline it originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed bytes, invalid integers, conflicting duplicate headers.
    BadRequest,
    /// Invalid `%HH` escape in a request target.
    UrlDecoding,
    /// Header count or byte-size limits exceeded.
    HeaderFieldsTooLarge,
    /// Request target exceeds the configured length limit.
    UriTooLong,
    /// `Content-Length` or a chunk size exceeds the configured limit.
    BodyTooLarge,
    /// Router matched the path but not the method.
    MethodNotAllowed,
    /// Router has no route for the path.
    NotFound,
    /// Unknown `Transfer-Encoding` or `Content-Encoding` coding.
    UnsupportedEncoding,
    /// Request-line protocol token not in the accepted set.
    UnsupportedProtocol,
    /// Request-line method token not in the known set.
    NotImplemented,
    /// Read-timeout elapsed while still receiving headers.
    RequestTimeout,
    /// Handler panic or other unclassified failure; never leaks its message to the client.
    Internal,
    /// Sentinel: a response has already been rendered, the connection must now close.
    CloseConnection,
}

impl ErrorKind {
    /// Maps the kind to the HTTP status it renders as by default.
    pub const fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest | ErrorKind::UrlDecoding => StatusCode::BAD_REQUEST,
            ErrorKind::HeaderFieldsTooLarge => StatusCode::HEADER_FIELDS_TOO_LARGE,
            ErrorKind::UriTooLong => StatusCode::URI_TOO_LONG,
            ErrorKind::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::UnsupportedEncoding => StatusCode::NOT_ACCEPTABLE,
            ErrorKind::UnsupportedProtocol => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
            ErrorKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ErrorKind::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ErrorKind::Internal | ErrorKind::CloseConnection => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this kind, when raised mid-request, means the connection cannot be trusted to
    /// continue (malformed stream state) and must close after the error response is sent.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, ErrorKind::MethodNotAllowed | ErrorKind::NotFound)
    }
}

/// An error surfaced by the parser, body reader, or router.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        let message = kind.status().reason().to_string();
        Self { kind, message }
    }
}
