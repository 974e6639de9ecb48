//! Unified error types.
//!
//! Per-request problems (an `Accept` header nothing satisfies) are answered
//! as HTTP responses and never surface here. Everything in this module is
//! fatal to the process.

use thiserror::Error;

/// Result type using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned by envsnap's fallible operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Startup configuration that cannot be served.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("prefix is required")]
    EmptyPrefix,

    #[error("http address is required")]
    EmptyAddress,
}
