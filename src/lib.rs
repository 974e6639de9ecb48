//! # envsnap
//!
//! Serves a prefix-filtered snapshot of the process environment over HTTP.
//! Drop it next to a container to see exactly which configuration the
//! platform injected.
//!
//! ## The contract
//!
//! - The environment is read **once**, before the listener binds. Variables
//!   whose name starts with the prefix are kept, with the prefix stripped.
//! - Every request, whatever its method or path, gets the same snapshot.
//! - The `Accept` header picks `text/plain` (`KEY=VALUE` lines) or
//!   `application/json` (one flat object). Anything else is a `500`.
//! - Ctrl-C stops accepting, gives in-flight requests 5 s, then exits.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use envsnap::{Config, FilteredEnv, Lifecycle};
//!
//! #[tokio::main]
//! async fn main() -> envsnap::Result<()> {
//!     let config = Config { prefix: "CONFIG_".into(), http: "127.0.0.1:8080".into() };
//!     let env = FilteredEnv::from_entries(&config.prefix, ["CONFIG_FOO=bar"]);
//!
//!     Lifecycle::start_with(&config, env).await?.run().await
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod server;

pub mod config;
pub mod env;
pub mod lifecycle;
pub mod negotiate;

pub use config::Config;
pub use env::FilteredEnv;
pub use error::{ConfigError, Error, Result};
pub use handler::EnvHandler;
pub use lifecycle::{Lifecycle, State};
pub use negotiate::{MediaType, NegotiationError, negotiate};
pub use request::Request;
pub use response::{ContentType, Response, ResponseBuilder};
pub use server::{DEFAULT_GRACE_PERIOD, Server};
