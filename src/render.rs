//! Serializes a [`Response`] onto a connection, given the originating [`Request`]'s protocol
//! version and keep-alive signals.
//!
//! Responsibilities, strictly in order: decide keep-alive, write the status line, write headers
//! (builder headers, then unset defaults, then cookies, then computed `Content-Type` /
//! `Content-Length` / `Transfer-Encoding`), write the CRLF terminator, write the body.

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::{Config, KeepAlive};
use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::{Body, Response};
use crate::status::StatusCode;
use crate::version::Version;

/// Size of the reusable block buffer used to stream sized bodies.
pub const STREAM_BLOCK_SIZE: usize = 64 * 1024;

/// What the connection driver should do after a render completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub keep_alive: bool,
}

/// The subset of a [`Request`] the renderer needs, captured before the request itself is moved
/// into [`crate::router::Router::dispatch`] (handlers take ownership of the request).
#[derive(Debug, Clone, Copy)]
pub struct RequestMeta {
    pub version: Version,
    pub method: Method,
    pub close_requested: bool,
    pub keep_alive_requested: bool,
}

impl From<&Request> for RequestMeta {
    fn from(req: &Request) -> Self {
        Self {
            version: req.version(),
            method: req.method(),
            close_requested: req.close_requested(),
            keep_alive_requested: req.keep_alive_requested(),
        }
    }
}

fn decide_keep_alive(meta: &RequestMeta, response: &Response, config: &Config) -> bool {
    if response.force_close {
        return false;
    }
    let protocol_default = match meta.version {
        Version::HTTP_09 => false,
        Version::HTTP_11 => !meta.close_requested,
        Version::HTTP_10 => meta.keep_alive_requested,
        _ => false,
    };
    match config.keep_alive {
        KeepAlive::Always => protocol_default || meta.version != Version::HTTP_09,
        KeepAlive::Never => false,
        KeepAlive::Default => protocol_default,
    }
}

fn forbids_content_length(code: StatusCode, method: Method) -> bool {
    code.is_informational() || code == StatusCode::NO_CONTENT || code == StatusCode::NOT_MODIFIED || method == Method::HEAD
}

/// Renders `response` onto `out`. `block_buf` is a reusable scratch buffer for streamed bodies;
/// callers keep it around across requests to avoid reallocating per response.
pub async fn render<W: AsyncWrite + Unpin>(
    out: &mut W,
    meta: &RequestMeta,
    mut response: Response,
    config: &Config,
    block_buf: &mut Vec<u8>,
) -> Result<Outcome, Error>
where
    W: AsyncWrite,
{
    // Resolve a file body into bytes-known-length before the generic header/body write path,
    // giving the error callback one chance to substitute a different response.
    if let Body::File(path) = &response.body {
        match File::open(path).await {
            Ok(file) => {
                let stat = file.metadata().await.map_err(io_err)?;
                response.body = Body::Stream { size: Some(stat.len()), reader: Box::new(file) };
            }
            Err(e) => {
                response = match response.on_file_error.take() {
                    Some(cb) => cb(e),
                    None => Response::new().code(StatusCode::NOT_FOUND).string("Not Found"),
                };
                if let Body::File(_) = &response.body {
                    return Err(io_err(std::io::Error::other("file error handler returned another file body")));
                }
            }
        }
    }

    let keep_alive = decide_keep_alive(meta, &response, config);

    let reason = response.reason.as_deref().unwrap_or_else(|| response.code.reason());
    let status_line = format!("{} {} {}\r\n", meta.version.as_str(), response.code.as_u16(), reason);
    out.write_all(status_line.as_bytes()).await.map_err(io_err)?;

    let body_size = match &response.body {
        Body::Empty => Some(0u64),
        Body::Buffered(b) => Some(b.len() as u64),
        Body::Stream { size, .. } => *size,
        Body::File(_) => unreachable!("resolved above"),
    };

    let mut header_buf = Vec::with_capacity(256);
    for (k, v) in response.headers.iter() {
        header_buf.extend_from_slice(k.as_bytes());
        header_buf.extend_from_slice(b": ");
        header_buf.extend_from_slice(v.as_bytes());
        header_buf.extend_from_slice(b"\r\n");
    }
    for (k, v) in config.default_headers.iter() {
        if response.headers.contains_key(k) {
            continue;
        }
        header_buf.extend_from_slice(k.as_bytes());
        header_buf.extend_from_slice(b": ");
        header_buf.extend_from_slice(v.as_bytes());
        header_buf.extend_from_slice(b"\r\n");
    }
    for cookie in &response.cookies {
        header_buf.extend_from_slice(b"Set-Cookie: ");
        header_buf.extend_from_slice(cookie.render().as_bytes());
        header_buf.extend_from_slice(b"\r\n");
    }

    if !response.headers.contains_key("Content-Type") {
        let ct = response.content_type.as_deref().unwrap_or(&config.default_content_type);
        header_buf.extend_from_slice(b"Content-Type: ");
        header_buf.extend_from_slice(ct.as_bytes());
        if ct.starts_with("text/") {
            if let Some(charset) = &response.charset {
                header_buf.extend_from_slice(b"; charset=");
                header_buf.extend_from_slice(charset.as_bytes());
            }
        }
        header_buf.extend_from_slice(b"\r\n");
    }

    let chunked_response = !response.headers.contains_key("Content-Length")
        && !response.headers.contains_key("Transfer-Encoding")
        && !forbids_content_length(response.code, meta.method)
        && body_size.is_none();

    if chunked_response {
        header_buf.extend_from_slice(b"Transfer-Encoding: chunked\r\n");
    } else if let Some(size) = body_size {
        if !forbids_content_length(response.code, meta.method) && !response.headers.contains_key("Content-Length") {
            let mut len_buf = itoa::Buffer::new();
            header_buf.extend_from_slice(b"Content-Length: ");
            header_buf.extend_from_slice(len_buf.format(size).as_bytes());
            header_buf.extend_from_slice(b"\r\n");
        }
    }

    if !keep_alive {
        header_buf.extend_from_slice(b"Connection: close\r\n");
    } else if meta.version == Version::HTTP_10 {
        header_buf.extend_from_slice(b"Connection: keep-alive\r\n");
    }

    out.write_all(&header_buf).await.map_err(io_err)?;
    out.write_all(b"\r\n").await.map_err(io_err)?;

    if meta.method != Method::HEAD {
        write_body(out, response.body, chunked_response, block_buf).await?;
    }

    Ok(Outcome { keep_alive })
}

async fn write_body<W: AsyncWrite + Unpin>(
    out: &mut W,
    body: Body,
    chunked: bool,
    block_buf: &mut Vec<u8>,
) -> Result<(), Error> {
    match body {
        Body::Empty => Ok(()),
        Body::Buffered(bytes) => out.write_all(&bytes).await.map_err(io_err),
        Body::File(_) => unreachable!("resolved into Stream before write_body"),
        Body::Stream { mut reader, .. } => {
            block_buf.resize(STREAM_BLOCK_SIZE, 0);
            loop {
                let n = reader.read(block_buf).await.map_err(io_err)?;
                if n == 0 {
                    break;
                }
                if chunked {
                    write_chunk(out, &block_buf[..n]).await?;
                } else {
                    out.write_all(&block_buf[..n]).await.map_err(io_err)?;
                }
            }
            if chunked {
                out.write_all(b"0\r\n\r\n").await.map_err(io_err)?;
            }
            Ok(())
        }
    }
}

async fn write_chunk<W: AsyncWrite + Unpin>(out: &mut W, data: &[u8]) -> Result<(), Error> {
    let size_line = format!("{:x}\r\n", data.len());
    out.write_all(size_line.as_bytes()).await.map_err(io_err)?;
    out.write_all(data).await.map_err(io_err)?;
    out.write_all(b"\r\n").await.map_err(io_err)
}

fn io_err(e: std::io::Error) -> Error {
    Error::new(crate::error::ErrorKind::Internal, e.to_string())
}
