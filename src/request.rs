//! The parsed request handed to handlers and middleware.
//!
//! [`Request::from_raw_head`] is the single point where the parser's borrowed
//! [`RawHead`](crate::h1::RawHead) is committed: path bytes are percent-decoded, and header
//! key/value bytes are copied, into the connection's [`Arena`]. Everything past that point is
//! owned, so a `Request` outlives the read buffer it was parsed out of.

use std::net::SocketAddr;

use crate::arena::Arena;
use crate::body::BodyReader;
use crate::cookie;
use crate::env::Env;
use crate::error::{Error, ErrorKind};
use crate::h1::RawHead;
use crate::kv::KvList;
use crate::method::Method;
use crate::percent;
use crate::query;
use crate::version::Version;

/// A fully parsed, owned HTTP request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    version: Version,
    path: String,
    raw_query: String,
    headers: KvList,
    params: KvList,
    content_length: Option<u64>,
    chunked: bool,
    upgrade: Option<String>,
    keep_alive_requested: bool,
    close_requested: bool,
    remote: Option<SocketAddr>,
    env: Env,
    query: Option<KvList>,
    cookies: Option<KvList>,
    body: Option<BodyReader>,
}

impl Request {
    /// Commits a parser-borrowed [`RawHead`] into an owned `Request`, percent-decoding the path
    /// through `arena` and copying header bytes out of the read buffer.
    pub fn from_raw_head(raw: RawHead<'_>, arena: &mut Arena, remote: Option<SocketAddr>) -> Result<Self, Error> {
        let decoded_path = percent::decode_lazy(raw.path).map_err(|_| Error::from(ErrorKind::UrlDecoding))?;
        let path_start = arena.mark();
        arena.extend(decoded_path.as_slice());
        let path_span = arena.finish(path_start);
        let path = arena.to_string_lossy(path_span);

        let raw_query = raw.query.map(|q| String::from_utf8_lossy(q).into_owned()).unwrap_or_default();

        let mut headers = KvList::with_capacity(raw.headers.len());
        for (name, value) in &raw.headers {
            headers.append(String::from_utf8_lossy(name).into_owned(), String::from_utf8_lossy(value).into_owned());
        }

        Ok(Self {
            method: raw.method,
            version: raw.version,
            path,
            raw_query,
            headers,
            params: KvList::new(),
            content_length: raw.content_length,
            chunked: raw.chunked,
            upgrade: raw.upgrade.map(|u| String::from_utf8_lossy(u).into_owned()),
            keep_alive_requested: raw.connection_keep_alive,
            close_requested: raw.connection_close,
            remote,
            env: Env::new(),
            query: None,
            cookies: None,
            body: None,
        })
    }

    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sets the path, used by the router to rewrite it during dispatch (e.g. stripping a mount
    /// prefix). Does not affect the raw query string.
    pub fn set_path(&mut self, path: String) {
        self.path = path;
    }

    #[inline]
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// Parses and caches the query string on first access.
    pub fn query(&mut self) -> &KvList {
        if self.query.is_none() {
            self.query = Some(query::parse_query(self.raw_query.as_bytes()));
        }
        self.query.as_ref().expect("just populated")
    }

    /// Parses and caches the `Cookie` header into a jar on first access. Absent header yields
    /// an empty jar.
    pub fn cookies(&mut self) -> &KvList {
        if self.cookies.is_none() {
            let raw = self.headers.get("cookie").unwrap_or("");
            self.cookies = Some(cookie::parse_jar(raw));
        }
        self.cookies.as_ref().expect("just populated")
    }

    #[inline]
    pub fn headers(&self) -> &KvList {
        &self.headers
    }

    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Route parameters captured from `{name}` segments, populated by the router before the
    /// handler is invoked.
    #[inline]
    pub fn params(&self) -> &KvList {
        &self.params
    }

    #[inline]
    pub fn params_mut(&mut self) -> &mut KvList {
        &mut self.params
    }

    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    #[inline]
    pub fn upgrade(&self) -> Option<&str> {
        self.upgrade.as_deref()
    }

    #[inline]
    pub fn remote(&self) -> Option<SocketAddr> {
        self.remote
    }

    #[inline]
    pub fn env(&self) -> &Env {
        &self.env
    }

    #[inline]
    pub fn env_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    /// Whether the client explicitly requested `Connection: keep-alive`.
    #[inline]
    pub fn keep_alive_requested(&self) -> bool {
        self.keep_alive_requested
    }

    /// Whether the client explicitly requested `Connection: close`.
    #[inline]
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Builds a body reader matching this request's framing. `None` means no body was declared.
    pub fn build_body_reader(&self, max_chunk_size: u64) -> Option<BodyReader> {
        if self.chunked {
            Some(BodyReader::chunked(max_chunk_size))
        } else {
            match self.content_length {
                Some(0) | None => None,
                Some(n) => Some(BodyReader::fixed(n)),
            }
        }
    }

    /// Attaches the body reader the connection driver constructed via
    /// [`build_body_reader`](Request::build_body_reader), before the handler is invoked.
    pub fn attach_body(&mut self, reader: Option<BodyReader>) {
        self.body = reader;
    }

    #[inline]
    pub fn body(&self) -> Option<&BodyReader> {
        self.body.as_ref()
    }

    #[inline]
    pub fn body_mut(&mut self) -> Option<&mut BodyReader> {
        self.body.as_mut()
    }

    /// Takes ownership of the body reader, leaving `None` behind. Handlers that want to stream
    /// the body past their own return (e.g. into a spawned task) use this.
    pub fn take_body(&mut self) -> Option<BodyReader> {
        self.body.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::h1::parse_head;
    use crate::{config::Limits, h1::Status};

    fn raw_head(buf: &'static [u8]) -> RawHead<'static> {
        match parse_head(buf, &Limits::default()).unwrap() {
            Status::Complete(head) => head,
            Status::NeedMore => panic!("expected complete head"),
        }
    }

    #[test]
    fn commits_percent_decoded_path_into_arena() {
        let raw = raw_head(b"GET /a%20b?x=1 HTTP/1.1\r\nHost: h\r\n\r\n");
        let mut arena = Arena::new();
        let req = Request::from_raw_head(raw, &mut arena, None).unwrap();
        assert_eq!(req.path(), "/a b");
        assert_eq!(req.raw_query(), "x=1");
        assert_eq!(req.header("host"), Some("h"));
    }

    #[test]
    fn query_is_parsed_lazily_and_cached() {
        let raw = raw_head(b"GET /?a=1&b=2 HTTP/1.1\r\n\r\n");
        let mut arena = Arena::new();
        let mut req = Request::from_raw_head(raw, &mut arena, None).unwrap();
        assert_eq!(req.query().get("a"), Some("1"));
        assert_eq!(req.query().get("b"), Some("2"));
    }

    #[test]
    fn cookies_are_parsed_lazily_from_header() {
        let raw = raw_head(b"GET / HTTP/1.1\r\nCookie: id=1; theme=dark\r\n\r\n");
        let mut arena = Arena::new();
        let mut req = Request::from_raw_head(raw, &mut arena, None).unwrap();
        assert_eq!(req.cookies().get("id"), Some("1"));
        assert_eq!(req.cookies().get("theme"), Some("dark"));
    }

    #[test]
    fn missing_cookie_header_yields_empty_jar() {
        let raw = raw_head(b"GET / HTTP/1.1\r\n\r\n");
        let mut arena = Arena::new();
        let mut req = Request::from_raw_head(raw, &mut arena, None).unwrap();
        assert!(req.cookies().is_empty());
    }

    #[test]
    fn body_reader_selects_chunked_over_fixed() {
        let raw = raw_head(b"POST / HTTP/1.1\r\nContent-Length: 5\r\nTransfer-Encoding: chunked\r\n\r\n");
        let mut arena = Arena::new();
        let req = Request::from_raw_head(raw, &mut arena, None).unwrap();
        assert!(req.build_body_reader(1024).unwrap().remaining_hint().is_none());
    }

    #[test]
    fn invalid_percent_escape_in_path_is_rejected() {
        let raw = raw_head(b"GET /%zz HTTP/1.1\r\n\r\n");
        let mut arena = Arena::new();
        let err = Request::from_raw_head(raw, &mut arena, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UrlDecoding);
    }
}
