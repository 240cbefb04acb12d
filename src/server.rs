//! Accepts connections and spawns one task per connection.
//!
//! ```text
//! loop:
//!   if shutdown already triggered -> stop accepting
//!   accept a socket, spawn Connection::new(socket, ...).with_shutdown(..).run()
//! once accepting stops:
//!   graceful -> await every spawned task (each exits between requests once it sees the signal)
//!   hard     -> abort every spawned task immediately
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::connection::Connection;
use crate::log::warning;
use crate::router::Router;

/// Abstracts over the socket type a [`Server`] accepts connections on.
pub trait Listener {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    fn accept(&self) -> impl Future<Output = io::Result<(Self::Stream, Option<SocketAddr>)>> + Send;
}

impl Listener for TcpListener {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<(Self::Stream, Option<SocketAddr>)> {
        let (stream, addr) = TcpListener::accept(self).await?;
        stream.set_nodelay(true).ok();
        Ok((stream, Some(addr)))
    }
}

#[cfg(unix)]
impl Listener for UnixListener {
    type Stream = UnixStream;

    async fn accept(&self) -> io::Result<(Self::Stream, Option<SocketAddr>)> {
        let (stream, _addr) = UnixListener::accept(self).await?;
        Ok((stream, None))
    }
}

/// Coordinates graceful or immediate shutdown of a running [`Server`].
///
/// Cloning shares the same underlying flag: the handle kept by the caller and the copies
/// threaded through every accepted [`Connection`] all observe the same trigger.
#[derive(Clone)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
    hard: Arc<AtomicBool>,
}

impl std::fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shutdown").field("triggered", &self.is_triggered()).finish()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Self { flag: Arc::new(AtomicBool::new(false)), notify: Arc::new(Notify::new()), hard: Arc::new(AtomicBool::new(false)) }
    }

    /// Stops the accept loop and lets every in-flight connection finish its current request
    /// before closing. Idle connections (between pipelined requests) close immediately.
    pub fn trigger_graceful(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Stops the accept loop and aborts every connection task outright, mid-request or not.
    pub fn trigger_hard(&self) {
        self.hard.store(true, Ordering::SeqCst);
        self.trigger_graceful();
    }

    pub(crate) fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn is_hard(&self) -> bool {
        self.hard.load(Ordering::SeqCst)
    }
}

/// Runs the accept loop for one listener, dispatching each connection to its own task.
pub struct Server<L> {
    listener: L,
    router: Router,
    config: Arc<Config>,
}

impl<L> std::fmt::Debug for Server<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server").finish_non_exhaustive()
    }
}

impl<L: Listener> Server<L> {
    pub fn new(listener: L, router: Router, config: Config) -> Self {
        Self { listener, router, config: Arc::new(config) }
    }

    /// Accepts connections until `shutdown` is triggered, then drains (graceful) or aborts
    /// (hard) every connection spawned so far before returning.
    pub async fn serve(self, shutdown: Shutdown) {
        let tasks: Mutex<Vec<JoinHandle<()>>> = Mutex::new(Vec::new());

        loop {
            if shutdown.is_triggered() {
                break;
            }

            tokio::select! {
                _ = shutdown.notify.notified() => break,
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            let conn = Connection::new(stream, self.config.clone(), self.router.clone(), addr)
                                .with_shutdown(shutdown.clone());
                            let handle = tokio::spawn(conn.run());
                            tasks.lock().unwrap().push(handle);
                        }
                        Err(e) => warning!("accept failed: {e}"),
                    }
                }
            }
        }

        let handles = std::mem::take(&mut *tasks.lock().unwrap());
        if shutdown.is_hard() {
            for handle in handles {
                handle.abort();
            }
        } else {
            for handle in handles {
                let _ = handle.await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouterBuilder;
    use std::time::Duration;

    #[tokio::test]
    async fn graceful_shutdown_drains_in_flight_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut builder = RouterBuilder::new();
        builder.route(crate::method::Method::GET, "/", |_req| async { crate::response::Response::new().string("ok") });
        let router = builder.build();

        let server = Server::new(listener, router, Config::default());
        let shutdown = Shutdown::new();
        let server_task = tokio::spawn(server.serve(shutdown.clone()));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        stream.write_all(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n").await.unwrap();

        shutdown.trigger_graceful();

        let mut resp = Vec::new();
        stream.read_to_end(&mut resp).await.unwrap();
        assert!(String::from_utf8_lossy(&resp).starts_with("HTTP/1.1 200 OK"));

        tokio::time::timeout(Duration::from_secs(5), server_task).await.unwrap().unwrap();
    }
}
