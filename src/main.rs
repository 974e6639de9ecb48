//! `envsnap` binary.
//!
//! ```text
//! parse flags ──▶ logging ──▶ Lifecycle::start ──▶ Lifecycle::run
//!                              (validate, snapshot, bind)
//! ```
//!
//! Run with:
//!   CONFIG_FOO=bar RUST_LOG=info envsnap -p CONFIG_ -http :8080
//!
//! Try:
//!   curl -H 'accept: application/json' http://localhost:8080/
//!   curl -H 'accept: text/plain' http://localhost:8080/

use std::process::ExitCode;

use envsnap::{Config, Lifecycle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::try_parse_args(std::env::args_os()) {
        Ok(config) => config,
        Err(e) => e.exit(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "envsnap=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match Lifecycle::start(&config).await {
        Ok(lifecycle) => lifecycle.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
