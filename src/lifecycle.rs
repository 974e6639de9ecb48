//! Process lifecycle: start, serve, wait for an interrupt, stop.
//!
//! ```text
//! Starting ──▶ Running ──(Ctrl-C or token cancelled)──▶ ShuttingDown ──▶ Stopped
//!    │
//!    └─ empty prefix/address or bind failure: fatal, nothing is served
//! ```
//!
//! Two tasks run while the server is up: the serving task, which also
//! performs the bounded shutdown once the token fires, and the signal task,
//! which fires the token. [`Lifecycle::run`] joins both before returning.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::env::FilteredEnv;
use crate::error::Result;
use crate::handler::EnvHandler;
use crate::server::Server;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Starting     => "starting",
            Self::Running      => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped      => "stopped",
        })
    }
}

/// Resolves when the process receives an interrupt.
pub type Interrupt = Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'static>>;

/// A validated, bound service that has not started serving yet.
pub struct Lifecycle {
    server: Server,
    handler: EnvHandler,
    shutdown: CancellationToken,
    interrupt: Interrupt,
}

impl Lifecycle {
    /// Validates `config`, snapshots the process environment and binds.
    pub async fn start(config: &Config) -> Result<Self> {
        config.validate()?;
        let env = FilteredEnv::capture(&config.prefix);
        Self::bind(config, env).await
    }

    /// Like [`start`](Self::start) but serves the given snapshot.
    pub async fn start_with(config: &Config, env: FilteredEnv) -> Result<Self> {
        config.validate()?;
        Self::bind(config, env).await
    }

    /// `config` must already be validated.
    async fn bind(config: &Config, env: FilteredEnv) -> Result<Self> {
        debug!(state = %State::Starting, entries = env.len());

        let handler = EnvHandler::new(env);
        // The interrupt listener must exist before clients can connect.
        let interrupt = interrupt();
        let server = Server::bind_first(&config.bind_addresses()).await?;

        info!(prefix = %config.prefix, http = %config.http, "server started");

        Ok(Self { server, handler, shutdown: CancellationToken::new(), interrupt })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// The token that stops the server when cancelled. Ctrl-C cancels it too.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.server = self.server.with_grace_period(grace_period);
        self
    }

    /// Serves until shutdown is triggered and completed.
    pub async fn run(self) -> Result<()> {
        let Self { server, handler, shutdown, interrupt } = self;
        debug!(state = %State::Running, addr = %server.local_addr());

        let serving = tokio::spawn(server.serve(handler, shutdown.clone()));
        let signal = tokio::spawn(wait_for_shutdown(interrupt, shutdown.clone()));

        let served = serving.await;
        // The serving task only returns early on failure; make sure the
        // signal task is released either way.
        shutdown.cancel();
        signal.await?;
        served??;

        debug!(state = %State::Stopped);
        info!("server stopped");
        Ok(())
    }
}

/// Registers a Ctrl-C (SIGINT) listener right away and returns a future that
/// resolves on the next interrupt.
///
/// Must be called inside a tokio runtime.
pub fn interrupt() -> Interrupt {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let registered = signal(SignalKind::interrupt());
        Box::pin(async move {
            registered?.recv().await;
            Ok::<(), io::Error>(())
        })
    }

    #[cfg(not(unix))]
    {
        Box::pin(tokio::signal::ctrl_c())
    }
}

/// Resolves on `interrupt` or when `shutdown` is cancelled elsewhere, and
/// leaves `shutdown` cancelled.
///
/// If `interrupt` fails the server keeps running and only an external
/// cancellation stops it. Further interrupts are ignored.
pub async fn wait_for_shutdown(
    interrupt: impl Future<Output = io::Result<()>>,
    shutdown: CancellationToken,
) {
    tokio::select! {
        res = interrupt => match res {
            Ok(()) => info!("signal captured, stopping"),
            Err(e) => {
                error!("failed to listen for interrupt: {e}");
                shutdown.cancelled().await;
            }
        },
        () = shutdown.cancelled() => {}
    }

    debug!(state = %State::ShuttingDown);
    shutdown.cancel();
}
