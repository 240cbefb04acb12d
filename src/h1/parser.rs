//! Request-line and header-block parser.
//!
//! [`parse_head`] is fed the connection's entire currently-buffered bytes on every call — like
//! `httparse`, it does not keep parser state across `Partial` results, it simply rescans from
//! the start once more bytes have arrived. This is safe because header blocks are bounded by
//! [`crate::config::Limits`], so the rescan cost never grows unbounded. Everything it returns
//! borrows from the input buffer; [`crate::request::Request::from_raw_head`] is what copies the
//! borrowed spans into the connection's [`Arena`](crate::arena::Arena) once the head is known
//! complete, so a `Partial` result never leaves any state behind to unwind.

use crate::config::Limits;
use crate::error::{Error, ErrorKind};
use crate::matches::{is_header_value, is_ows, is_token};
use crate::method::Method;
use crate::version::Version;

/// Outcome of a single parse attempt over the currently available bytes.
#[derive(Debug)]
pub enum Status<T> {
    /// Not enough bytes yet; call again once more have been read.
    NeedMore,
    /// The head was fully parsed; carries the parsed head.
    Complete(T),
}

/// A parsed head, borrowing every token directly from the input buffer.
///
/// Request target bytes (`path`, `query`) are **not** percent-decoded here — that happens when
/// the head is committed into the connection arena, see [`crate::request::Request::from_raw_head`].
#[derive(Debug)]
pub struct RawHead<'a> {
    pub method: Method,
    pub version: Version,
    pub path: &'a [u8],
    pub query: Option<&'a [u8]>,
    pub headers: Vec<(&'a [u8], &'a [u8])>,
    pub content_length: Option<u64>,
    pub chunked: bool,
    pub upgrade: Option<&'a [u8]>,
    pub connection_close: bool,
    pub connection_keep_alive: bool,
    /// Number of bytes of `buf` consumed by the head, i.e. where the body (if any) starts.
    pub consumed: usize,
}

fn bad_request(msg: &'static str) -> Error {
    Error::new(ErrorKind::BadRequest, msg)
}

/// Scans one CRLF-terminated line starting at `buf[0]`. A bare `\n` is rejected — RFC 9112
/// requires CRLF; a lone trailing `\r` without a following `\n` is reported as [`Status::NeedMore`]
/// since the next byte hasn't arrived yet.
fn scan_line(buf: &[u8]) -> Result<Status<(usize, usize)>, Error> {
    let mut i = 0;
    while i < buf.len() {
        match buf[i] {
            b'\r' => match buf.get(i + 1) {
                Some(b'\n') => return Ok(Status::Complete((i, i + 2))),
                Some(_) => return Err(bad_request("CR not followed by LF")),
                None => return Ok(Status::NeedMore),
            },
            b'\n' => return Err(bad_request("bare LF in header block")),
            _ => i += 1,
        }
    }
    Ok(Status::NeedMore)
}

fn trim_ows(mut bytes: &[u8]) -> &[u8] {
    while bytes.first().is_some_and(|&b| is_ows(b)) {
        bytes = &bytes[1..];
    }
    while bytes.last().is_some_and(|&b| is_ows(b)) {
        bytes = &bytes[..bytes.len() - 1];
    }
    bytes
}

fn parse_ascii_u64(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        n = n.checked_mul(10)?.checked_add((b - b'0') as u64)?;
    }
    Some(n)
}

fn find_subslice(hay: &[u8], needle: &[u8]) -> Option<usize> {
    hay.windows(needle.len()).position(|w| w == needle)
}

/// Splits a request-target into its raw (still percent-encoded) path and query components.
///
/// Accepts origin-form (`/path?query`), asterisk-form (`*`, for server-wide `OPTIONS`), and
/// absolute-form (`scheme://authority/path?query`) — for the latter only the path and query
/// are retained, per RFC 9112 section 3.2.2. A fragment, if present, is discarded as it is
/// never sent by conforming clients but tolerated here rather than rejected.
fn split_target(target: &[u8]) -> Result<(&[u8], Option<&[u8]>), Error> {
    if target == b"*" {
        return Ok((target, None));
    }

    let mut t = target;
    if !t.starts_with(b"/") {
        match find_subslice(t, b"://") {
            Some(pos) => {
                let after = &t[pos + 3..];
                let path_start = after.iter().position(|&b| b == b'/').unwrap_or(after.len());
                t = &after[path_start..];
                if t.is_empty() {
                    return Ok((b"/", None));
                }
            }
            None => return Err(bad_request("request target is not origin-form, *, or absolute-form")),
        }
    }

    let t = match t.iter().position(|&b| b == b'#') {
        Some(p) => &t[..p],
        None => t,
    };

    match t.iter().position(|&b| b == b'?') {
        Some(p) => Ok((&t[..p], Some(&t[p + 1..]))),
        None => Ok((t, None)),
    }
}

fn parse_request_line<'a>(line: &'a [u8], limits: &Limits) -> Result<(Method, &'a [u8], Version), Error> {
    let sp1 = line.iter().position(|&b| b == b' ').ok_or_else(|| bad_request("missing method"))?;
    let method_bytes = &line[..sp1];

    if method_bytes.is_empty() || method_bytes.len() > limits.max_method_len {
        return Err(bad_request("method length out of bounds"));
    }
    if !method_bytes.iter().all(|&b| is_token(b)) {
        return Err(Error::from(ErrorKind::NotImplemented));
    }
    let method = Method::from_bytes(method_bytes).ok_or_else(|| Error::from(ErrorKind::NotImplemented))?;

    let rest = &line[sp1 + 1..];
    let sp2 = rest.iter().rposition(|&b| b == b' ').ok_or_else(|| bad_request("missing version"))?;
    let target = &rest[..sp2];
    if target.is_empty() || target.len() > limits.max_path_len {
        return Err(Error::from(ErrorKind::UriTooLong));
    }

    let version_tok = &rest[sp2 + 1..];
    let version = Version::from_bytes(version_tok).ok_or_else(|| Error::from(ErrorKind::UnsupportedProtocol))?;

    Ok((method, target, version))
}

/// Parses a full HTTP/1.x head (request line + headers) out of `buf`.
///
/// Returns [`Status::NeedMore`] if `buf` does not yet contain a complete head; the caller
/// should read more bytes and call again with the extended buffer. Returns
/// [`Status::Complete`] with the parsed head and the number of bytes it occupied.
pub fn parse_head<'a>(buf: &'a [u8], limits: &Limits) -> Result<Status<RawHead<'a>>, Error> {
    let (line_end, mut cursor) = match scan_line(buf)? {
        Status::NeedMore => return Ok(Status::NeedMore),
        Status::Complete((end, next)) => (end, next),
    };

    let (method, target, version) = parse_request_line(&buf[..line_end], limits)?;

    if find_subslice(target, b"://").is_some() && version != Version::HTTP_11 {
        return Err(bad_request("absolute-form target requires HTTP/1.1"));
    }

    let (path, query) = split_target(target)?;

    let mut headers = Vec::new();
    let mut content_length: Option<u64> = None;
    let mut chunked = false;
    let mut upgrade = None;
    let mut connection_close = false;
    let mut connection_keep_alive = false;
    let mut total_header_bytes = 0usize;

    loop {
        let (end, next) = match scan_line(&buf[cursor..])? {
            Status::NeedMore => return Ok(Status::NeedMore),
            Status::Complete(pos) => pos,
        };
        let line = &buf[cursor..cursor + end];

        if line.is_empty() {
            cursor += next;
            break;
        }

        let colon = line.iter().position(|&b| b == b':').ok_or_else(|| bad_request("header missing colon"))?;
        let name = &line[..colon];
        if name.is_empty() || !name.iter().all(|&b| is_token(b)) {
            return Err(bad_request("invalid header field name"));
        }
        if name.len() > limits.max_header_key_len {
            return Err(Error::from(ErrorKind::HeaderFieldsTooLarge));
        }

        let value = trim_ows(&line[colon + 1..]);
        if value.len() > limits.max_header_value_len {
            return Err(Error::from(ErrorKind::HeaderFieldsTooLarge));
        }
        if !value.iter().all(|&b| is_header_value(b)) {
            return Err(bad_request("invalid header field value"));
        }

        total_header_bytes += line.len();
        if total_header_bytes > limits.max_headers_total_bytes {
            return Err(Error::from(ErrorKind::HeaderFieldsTooLarge));
        }

        headers.push((name, value));
        if headers.len() > limits.max_header_count {
            return Err(Error::from(ErrorKind::HeaderFieldsTooLarge));
        }

        if name.eq_ignore_ascii_case(b"content-length") {
            let n = parse_ascii_u64(value).ok_or_else(|| bad_request("invalid content-length"))?;
            match content_length {
                Some(prev) if prev != n => return Err(bad_request("conflicting content-length")),
                _ => content_length = Some(n),
            }
        } else if name.eq_ignore_ascii_case(b"transfer-encoding") {
            let last = value.rsplit(|&b| b == b',').next().unwrap_or(value);
            let last = trim_ows(last);
            if last.eq_ignore_ascii_case(b"chunked") {
                chunked = true;
            } else {
                return Err(Error::from(ErrorKind::UnsupportedEncoding));
            }
        } else if name.eq_ignore_ascii_case(b"connection") {
            for tok in value.split(|&b| b == b',') {
                let tok = trim_ows(tok);
                if tok.eq_ignore_ascii_case(b"close") {
                    connection_close = true;
                } else if tok.eq_ignore_ascii_case(b"keep-alive") {
                    connection_keep_alive = true;
                }
            }
        } else if name.eq_ignore_ascii_case(b"upgrade") {
            upgrade = Some(value);
        }

        cursor += next;
    }

    Ok(Status::Complete(RawHead {
        method,
        version,
        path,
        query,
        headers,
        content_length,
        chunked,
        upgrade,
        connection_close,
        connection_keep_alive,
        consumed: cursor,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Limits {
        Limits::default()
    }

    #[test]
    fn minimal_get() {
        let buf = b"GET / HTTP/1.1\r\n\r\n";
        let Status::Complete(head) = parse_head(buf, &limits()).unwrap() else {
            panic!("expected complete")
        };
        assert_eq!(head.method, Method::GET);
        assert_eq!(head.path, b"/");
        assert_eq!(head.version, Version::HTTP_11);
        assert_eq!(head.consumed, buf.len());
        assert!(head.headers.is_empty());
    }

    #[test]
    fn partial_head_requests_more_bytes() {
        let buf = b"GET / HTTP/1.1\r\nHost: e";
        assert!(matches!(parse_head(buf, &limits()).unwrap(), Status::NeedMore));
    }

    #[test]
    fn query_and_headers_are_split_raw() {
        let buf = b"GET /q?hello=world&%20foo=+bar HTTP/1.1\r\nHost: h\r\n\r\n";
        let Status::Complete(head) = parse_head(buf, &limits()).unwrap() else {
            panic!("expected complete")
        };
        assert_eq!(head.path, b"/q");
        assert_eq!(head.query, Some(&b"hello=world&%20foo=+bar"[..]));
        assert_eq!(head.headers, vec![(&b"Host"[..], &b"h"[..])]);
    }

    #[test]
    fn chunked_wins_over_content_length() {
        let buf = b"POST / HTTP/1.1\r\nContent-Length: 5\r\nTransfer-Encoding: chunked\r\n\r\n";
        let Status::Complete(head) = parse_head(buf, &limits()).unwrap() else {
            panic!("expected complete")
        };
        assert!(head.chunked);
        assert_eq!(head.content_length, Some(5));
    }

    #[test]
    fn conflicting_content_length_is_bad_request() {
        let buf = b"POST / HTTP/1.1\r\nContent-Length: 5\r\nContent-Length: 6\r\n\r\n";
        let err = parse_head(buf, &limits()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let buf = b"FROB / HTTP/1.1\r\n\r\n";
        let err = parse_head(buf, &limits()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotImplemented);
    }

    #[test]
    fn bad_protocol_token_is_unsupported() {
        let buf = b"GET / HTTP/9.9\r\n\r\n";
        let err = parse_head(buf, &limits()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedProtocol);
    }

    #[test]
    fn lone_lf_is_rejected() {
        let buf = b"GET / HTTP/1.1\nHost: h\r\n\r\n";
        assert!(parse_head(buf, &limits()).is_err());
    }

    #[test]
    fn connection_tokens_are_parsed() {
        let buf = b"GET / HTTP/1.0\r\nConnection: keep-alive\r\n\r\n";
        let Status::Complete(head) = parse_head(buf, &limits()).unwrap() else {
            panic!("expected complete")
        };
        assert!(head.connection_keep_alive);
        assert!(!head.connection_close);
    }
}
