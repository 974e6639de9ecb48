//! HTTP server and graceful shutdown.
//!
//! # Shutdown sequence
//!
//! When the shared [`CancellationToken`] fires the server:
//! 1. Immediately stops `listener.accept()` and closes the listening socket.
//! 2. Asks every open connection to finish its in-flight request and close.
//!    Idle keep-alive connections close right away.
//! 3. Waits up to the grace period (5 s by default) for that to happen.
//! 4. Aborts whatever is still running and returns from [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{ConfigError, Error, Result};
use crate::handler::EnvHandler;
use crate::request::Request;

/// How long in-flight connections get once shutdown starts.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// A bound HTTP listener, ready to serve.
pub struct Server {
    listener: TcpListener,
    addr: SocketAddr,
    grace_period: Duration,
}

impl Server {
    /// Resolves `addr` and binds the listening socket.
    ///
    /// `addr` is anything tokio can resolve: `127.0.0.1:8080`,
    /// `[::]:8080`, `localhost:0`.
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr: addr.to_owned(), source })?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr, grace_period: DEFAULT_GRACE_PERIOD })
    }

    /// Binds the first of `addrs` that succeeds, or fails with the last error.
    pub async fn bind_first(addrs: &[String]) -> Result<Self> {
        let mut last_err = None;
        for addr in addrs {
            match Self::bind(addr).await {
                Ok(server) => return Ok(server),
                Err(e) => {
                    debug!(addr = %addr, "bind failed: {e}");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(Error::Config(ConfigError::EmptyAddress)))
    }

    /// The address actually bound. Differs from the requested one when the
    /// port was `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Accepts connections and answers every request through `handler` until
    /// `shutdown` is cancelled, then shuts down gracefully.
    ///
    /// Returns once every connection has finished or been aborted.
    pub async fn serve(self, handler: EnvHandler, shutdown: CancellationToken) -> Result<()> {
        // `auto::Builder` transparently handles both HTTP/1.1 and HTTP/2.
        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut tasks = JoinSet::new();

        debug!(addr = %self.addr, "accepting connections");

        loop {
            tokio::select! {
                // Check shutdown first so a cancelled token stops accepting
                // even if more connections are queued.
                biased;

                () = shutdown.cancelled() => {
                    info!(in_flight = tasks.len(), "shutting down, draining connections");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let handler = handler.clone();
                    let svc = service_fn(move |req| dispatch(handler.clone(), req));
                    let conn = builder.serve_connection(TokioIo::new(stream), svc).into_owned();
                    let conn = graceful.watch(conn);

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            debug!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(self.listener);

        if tokio::time::timeout(self.grace_period, graceful.shutdown()).await.is_err() {
            warn!(
                grace_period = ?self.grace_period,
                remaining = tasks.len(),
                "graceful shutdown timed out, closing remaining connections",
            );
            tasks.abort_all();
        }
        while tasks.join_next().await.is_some() {}

        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Answers one request. Every path and method goes to the same handler.
///
/// The body is never read. Failures are turned into responses by the handler,
/// so hyper never sees an error.
async fn dispatch(
    handler: EnvHandler,
    req: hyper::Request<Incoming>,
) -> std::result::Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, _body) = req.into_parts();
    let response = handler.handle(&Request::from_parts(&parts));
    Ok(response.into_inner())
}
