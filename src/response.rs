//! Fluent response builder.
//!
//! `Response` is value-typed: every setter takes `self` by value and returns it, so a builder
//! chain never has visible side effects until [`crate::render`] consumes it. Nothing here talks
//! to the network; [`file`](Response::file) records a path without opening it, and
//! [`stream`](Response::stream) records a reader without reading from it — the renderer performs
//! all I/O at render time.

use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::cookie::Cookie;
use crate::error::{Error, ErrorKind};
use crate::kv::KvList;
use crate::status::StatusCode;

/// A connection handed to a hijack callback: whatever raw duplex stream the driver was reading
/// from and writing to, boxed and type-erased.
pub trait HijackedConn: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> HijackedConn for T {}

/// Invoked by the connection driver once the socket has been handed off; the callback owns the
/// connection from this point on, including closing it.
pub type HijackFn = Box<dyn FnOnce(Box<dyn HijackedConn>) + Send>;

/// The response body, in the form the renderer will serialize it.
pub enum Body {
    /// No body at all (distinct from an empty buffered body: suppresses `Content-Length: 0`
    /// only where the renderer already omits it, e.g. `HEAD`/`204`/`304`).
    Empty,
    Buffered(Vec<u8>),
    /// Opened and stat'd by the renderer, not here.
    File(PathBuf),
    /// An arbitrary async reader. `size: None` switches the renderer to chunked encoding.
    Stream { reader: Box<dyn AsyncRead + Unpin + Send>, size: Option<u64> },
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Empty => f.write_str("Body::Empty"),
            Body::Buffered(b) => f.debug_tuple("Body::Buffered").field(&b.len()).finish(),
            Body::File(p) => f.debug_tuple("Body::File").field(p).finish(),
            Body::Stream { size, .. } => f.debug_struct("Body::Stream").field("size", size).finish(),
        }
    }
}

/// Callback invoked once if the renderer fails to open/stat a [`Body::File`]. Its result is
/// rendered in place of the original response; a second failure aborts the connection.
pub type FileErrorHandler = Box<dyn FnOnce(std::io::Error) -> Response + Send>;

/// A response under construction.
pub struct Response {
    pub(crate) code: StatusCode,
    pub(crate) reason: Option<String>,
    pub(crate) content_type: Option<String>,
    pub(crate) charset: Option<String>,
    pub(crate) headers: KvList,
    pub(crate) cookies: Vec<Cookie>,
    pub(crate) body: Body,
    pub(crate) force_close: bool,
    pub(crate) on_file_error: Option<FileErrorHandler>,
    pub(crate) hijack: Option<HijackFn>,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("code", &self.code)
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("body", &self.body)
            .field("force_close", &self.force_close)
            .finish()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self {
            code: StatusCode::OK,
            reason: None,
            content_type: None,
            charset: None,
            headers: KvList::new(),
            cookies: Vec::new(),
            body: Body::Empty,
            force_close: false,
            on_file_error: None,
            hijack: None,
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code(mut self, code: StatusCode) -> Self {
        self.code = code;
        self
    }

    /// Overrides the status line's reason phrase; by default the code's standard phrase is used.
    pub fn reason(mut self, text: impl Into<String>) -> Self {
        self.reason = Some(text.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the `charset` parameter appended to a `text/*` content type. Ignored by the
    /// renderer for other media types.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Appends a header, never overwriting an existing one of the same name.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    /// Empties all builder-set headers (cookies and computed headers are unaffected).
    pub fn discard_headers(mut self) -> Self {
        self.headers.clear();
        self
    }

    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn string(self, body: impl Into<String>) -> Self {
        self.bytes(body.into().into_bytes())
    }

    pub fn bytes(mut self, body: Vec<u8>) -> Self {
        self.body = Body::Buffered(body);
        self
    }

    /// Invokes `f` with an append-only sink for the buffered body.
    pub fn writer(mut self, f: impl FnOnce(&mut Vec<u8>)) -> Self {
        let mut buf = match self.body {
            Body::Buffered(b) => b,
            _ => Vec::new(),
        };
        f(&mut buf);
        self.body = Body::Buffered(buf);
        self
    }

    /// Records a file path to be opened and stat'd at render time.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.body = Body::File(path.into());
        self
    }

    /// Registers the callback invoked if [`file`](Response::file) fails to open or stat.
    pub fn on_file_error(mut self, f: impl FnOnce(std::io::Error) -> Response + Send + 'static) -> Self {
        self.on_file_error = Some(Box::new(f));
        self
    }

    /// Streams an arbitrary reader. `size = None` switches the renderer to chunked encoding.
    pub fn stream(mut self, reader: impl AsyncRead + Unpin + Send + 'static, size: Option<u64>) -> Self {
        self.body = Body::Stream { reader: Box::new(reader), size };
        self
    }

    #[cfg(feature = "json")]
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        self.body = Body::Buffered(bytes);
        self.content_type = Some("application/json".to_string());
        Ok(self)
    }

    /// Forces the renderer to close the connection after this response regardless of the
    /// protocol's default keep-alive decision.
    pub fn close(mut self) -> Self {
        self.force_close = true;
        self
    }

    /// Takes over the raw connection once the driver has drained any remaining request body.
    /// No response is rendered; `f` receives the boxed socket and owns its lifetime, including
    /// closing it. Used for protocol upgrades the router itself does not understand.
    pub fn hijack<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Box<dyn HijackedConn>) + Send + 'static,
    {
        self.hijack = Some(Box::new(f));
        self.force_close = true;
        self.body = Body::Empty;
        self
    }

    /// Takes the hijack callback, if the response requested one. Consumed by the connection
    /// driver before any rendering happens.
    pub(crate) fn take_hijack(&mut self) -> Option<HijackFn> {
        self.hijack.take()
    }

    /// Maps a known error to its status and a plain-text body carrying only the reason phrase —
    /// the error's `message` is never sent to the client.
    pub fn error(err: &Error, code_override: Option<StatusCode>) -> Self {
        let code = code_override.unwrap_or_else(|| err.status());
        let mut resp = Self::new().code(code).content_type("text/plain");
        resp = resp.string(code.reason());
        if err.kind.is_fatal() {
            resp = resp.close();
        }
        resp
    }

    /// Convenience for kinds without a live [`Error`] value (e.g. router dispatch outcomes).
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::error(&Error::from(kind), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain_sets_fields() {
        let resp = Response::new().code(StatusCode::CREATED).content_type("text/plain").string("ok");
        assert_eq!(resp.code, StatusCode::CREATED);
        assert_eq!(resp.content_type.as_deref(), Some("text/plain"));
        match resp.body {
            Body::Buffered(b) => assert_eq!(b, b"ok"),
            _ => panic!("expected buffered body"),
        }
    }

    #[test]
    fn discard_headers_empties_builder_headers() {
        let resp = Response::new().header("X-A", "1").header("X-B", "2").discard_headers();
        assert!(resp.headers.is_empty());
    }

    #[test]
    fn error_maps_kind_to_status_without_leaking_message() {
        let err = Error::new(ErrorKind::Internal, "db connection string leaked here");
        let resp = Response::error(&err, None);
        assert_eq!(resp.code, StatusCode::INTERNAL_SERVER_ERROR);
        match resp.body {
            Body::Buffered(b) => assert!(!String::from_utf8_lossy(&b).contains("leaked")),
            _ => panic!("expected buffered body"),
        }
        assert!(resp.force_close);
    }

    #[test]
    fn not_found_does_not_force_close() {
        let resp = Response::from_kind(ErrorKind::NotFound);
        assert!(!resp.force_close);
    }
}
