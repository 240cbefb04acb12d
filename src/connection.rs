//! Owns the read/parse/dispatch/render loop for one accepted socket.
//!
//! ```text
//! loop:
//!   feed parser with buffered tail; read more on NeedMore (respecting read-timeout)
//!   on parse error -> render matching error response, close
//!   build body reader, fully drain it into the request
//!   dispatch to the router
//!   if the response hijacked the connection -> hand the socket to it, stop
//!   otherwise render the response; if not keep-alive -> close
//!   keep unconsumed buffer tail for the next pipelined request
//! ```

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};
use tokio::time::timeout;

use crate::arena::Arena;
use crate::config::Config;
use crate::error::{Error, ErrorKind};
use crate::h1::{self, Status};
use crate::log::warning;
use crate::render;
use crate::request::Request;
use crate::response::{HijackFn, Response};
use crate::router::Router;
use crate::server::Shutdown;

/// What the driver does after serving one request.
enum Served {
    /// Render completed normally; `bool` is whether to keep the connection open.
    Continue(bool),
    /// A handler took over the raw socket; the driver exits without rendering anything further.
    /// The `Vec<u8>` is any bytes already read off the wire past the request being hijacked
    /// (e.g. the start of an upgraded protocol's first frame, pipelined behind the head read).
    Hijacked(HijackFn, Vec<u8>),
}

/// A socket with leftover already-read bytes prepended to its read side. Handed to a hijack
/// callback so bytes the driver already pulled off the wire are not lost.
struct Prefixed<S> {
    prefix: Vec<u8>,
    pos: usize,
    inner: S,
}

impl<S: AsyncRead + Unpin> AsyncRead for Prefixed<S> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        if self.pos < self.prefix.len() {
            let remaining = self.prefix.len() - self.pos;
            let n = remaining.min(buf.remaining());
            let start = self.pos;
            buf.put_slice(&self.prefix[start..start + n]);
            self.pos += n;
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for Prefixed<S> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// One accepted connection's read buffer, arena, and render scratch space.
pub struct Connection<S> {
    socket: S,
    config: Arc<Config>,
    router: Router,
    buf: Vec<u8>,
    filled: usize,
    arena: Arena,
    block_buf: Vec<u8>,
    remote: Option<SocketAddr>,
    shutdown: Option<Shutdown>,
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("remote", &self.remote).finish_non_exhaustive()
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(socket: S, config: Arc<Config>, router: Router, remote: Option<SocketAddr>) -> Self {
        Self {
            socket,
            buf: Vec::with_capacity(config.read_buffer_size),
            filled: 0,
            arena: Arena::with_capacity(config.read_buffer_size),
            block_buf: Vec::new(),
            config,
            router,
            remote,
            shutdown: None,
        }
    }

    /// Attaches a shutdown signal; the driver checks it between requests and closes the
    /// connection instead of reading the next pipelined one once it has tripped.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Drives the connection until the peer disconnects, a fatal error occurs, a handler
    /// hijacks the socket, or the protocol/response dictates the connection must close.
    pub async fn run(mut self)
    where
        S: Send + 'static,
    {
        loop {
            match self.serve_one().await {
                Ok(Served::Continue(true)) => {
                    if self.shutdown.as_ref().is_some_and(Shutdown::is_triggered) {
                        break;
                    }
                    continue;
                }
                Ok(Served::Continue(false)) => break,
                Ok(Served::Hijacked(f, leftover)) => {
                    f(Box::new(Prefixed { prefix: leftover, pos: 0, inner: self.socket }));
                    return;
                }
                Err(e) => {
                    warning!("connection closing after fatal error: {e}");
                    break;
                }
            }
        }
    }

    /// Reads more bytes into `self.buf`, appending past `self.filled`. Returns `false` on EOF.
    async fn read_more(&mut self, first_read: bool) -> Result<bool, Error> {
        let want = self.config.read_buffer_size.max(self.buf.len() - self.filled + 1);
        if self.buf.len() < self.filled + want {
            self.buf.resize(self.filled + want, 0);
        }
        let read_fut = self.socket.read(&mut self.buf[self.filled..]);
        let n = if first_read {
            // the very first read of a pipelined connection's next request has no deadline of
            // its own beyond the configured read-timeout; subsequent partial-head reads share
            // the same timeout, restarted per read per the per-call semantics in the resource
            // model.
            match timeout(self.config.read_timeout, read_fut).await {
                Ok(res) => res.map_err(io_err)?,
                Err(_) => return Ok(false),
            }
        } else {
            match timeout(self.config.read_timeout, read_fut).await {
                Ok(res) => res.map_err(io_err)?,
                Err(_) => return Err(Error::from(ErrorKind::RequestTimeout)),
            }
        };
        self.buf.truncate(self.filled + want);
        self.filled += n;
        self.buf.truncate(self.filled);
        Ok(n > 0)
    }

    /// Serves one request. `Served::Continue(false)` closes the connection cleanly.
    async fn serve_one(&mut self) -> Result<Served, Error> {
        self.arena.clear();

        loop {
            match h1::parse_head(&self.buf, &self.config.limits) {
                Ok(Status::Complete(head)) => {
                    let consumed = head.consumed;
                    let request = Request::from_raw_head(head, &mut self.arena, self.remote)?;
                    return self.handle(request, consumed).await;
                }
                Ok(Status::NeedMore) => {
                    let had_bytes = self.filled > 0;
                    if !self.read_more(!had_bytes).await? {
                        return Ok(Served::Continue(false));
                    }
                }
                Err(err) => {
                    self.write_error(err).await?;
                    return Ok(Served::Continue(false));
                }
            }
        }
    }

    async fn handle(&mut self, mut request: Request, head_len: usize) -> Result<Served, Error> {
        if let Some(cl) = request.content_length() {
            if cl > self.config.limits.max_body_size {
                self.write_error(Error::from(ErrorKind::BodyTooLarge)).await?;
                return Ok(Served::Continue(false));
            }
        }

        let mut reader = request.build_body_reader(self.config.limits.max_chunk_size);
        let mut body_end = head_len;
        if let Some(r) = &mut reader {
            body_end = self.fill_body(r, head_len).await?;
        }
        request.attach_body(reader);

        let meta = render::RequestMeta::from(&request);
        let mut response = self.router.dispatch(request).await;

        // the body has already been pulled off the socket in full by `fill_body` above, so the
        // "drain the body" step from the hijack contract is already satisfied by the time a
        // handler's response reaches here.
        if let Some(hijack_fn) = response.take_hijack() {
            let leftover = self.buf[body_end..self.filled].to_vec();
            self.filled = 0;
            self.buf.clear();
            return Ok(Served::Hijacked(hijack_fn, leftover));
        }

        let outcome = render::render(&mut self.socket, &meta, response, &self.config, &mut self.block_buf).await?;

        self.consume_and_compact(body_end);
        Ok(Served::Continue(outcome.keep_alive))
    }

    /// Feeds a body reader from already-buffered bytes, reading more from the socket as needed,
    /// until it reports exhaustion. Returns the offset in `self.buf` where the body ended.
    async fn fill_body(&mut self, reader: &mut crate::body::BodyReader, start: usize) -> Result<usize, Error> {
        let mut cursor = start;
        loop {
            if reader.is_exhausted() {
                return Ok(cursor);
            }
            if cursor < self.filled {
                let n = reader.feed(&self.buf[cursor..self.filled])?;
                cursor += n;
                if reader.queued_len() as u64 > self.config.limits.max_body_size {
                    return Err(Error::from(ErrorKind::BodyTooLarge));
                }
                if reader.is_exhausted() {
                    return Ok(cursor);
                }
            }
            if !self.read_more(false).await? {
                return Err(Error::new(ErrorKind::BadRequest, "connection closed mid-body"));
            }
        }
    }

    fn consume_and_compact(&mut self, through: usize) {
        self.buf.copy_within(through..self.filled, 0);
        self.filled -= through;
        self.buf.truncate(self.filled);
    }

    async fn write_error(&mut self, err: Error) -> Result<(), Error> {
        let resp = Response::error(&err, None);
        // a parse error happens before a `Request` exists; synthesize a minimal HTTP/1.1 one
        // purely to drive the renderer's keep-alive/header logic, then ignore its outcome since
        // the connection always closes after a head-level error.
        let buf = b"GET / HTTP/1.1\r\n\r\n";
        if let Ok(Status::Complete(head)) = h1::parse_head(buf, &self.config.limits) {
            let mut arena = Arena::new();
            if let Ok(req) = Request::from_raw_head(head, &mut arena, self.remote) {
                let meta = render::RequestMeta::from(&req);
                let resp = resp.close();
                let _ = render::render(&mut self.socket, &meta, resp, &self.config, &mut self.block_buf).await;
            }
        }
        Ok(())
    }
}

fn io_err(e: std::io::Error) -> Error {
    Error::new(ErrorKind::Internal, e.to_string())
}
