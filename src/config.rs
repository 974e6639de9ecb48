//! Command-line configuration.
//!
//! | Flag | Default | Meaning |
//! |---|---|---|
//! | `-p`, `--prefix` | `CONFIG_` | prefix selecting which variables are exposed |
//! | `-http`, `--http` | `:8080` | listen address |
//!
//! `-http ADDR` and `-http=ADDR` are rewritten to `--http` before clap sees
//! the arguments.

use std::ffi::OsString;

use clap::Parser;

use crate::error::ConfigError;

pub const DEFAULT_PREFIX: &str = "CONFIG_";
pub const DEFAULT_HTTP_ADDR: &str = ":8080";

/// Serve a prefix-filtered snapshot of the environment over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "envsnap", version, about)]
pub struct Config {
    /// Prefix for filtering environment variable names
    #[arg(short = 'p', long = "prefix", alias = "p", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// HTTP listen address; an empty host (":8080") binds all interfaces
    #[arg(long = "http", value_name = "ADDR", default_value = DEFAULT_HTTP_ADDR)]
    pub http: String,
}

impl Config {
    /// Parses `args` (program name first), accepting `-http ADDR` and
    /// `-http=ADDR` as spellings of `--http`.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(args.into_iter().map(|arg| normalize_arg(arg.into())))
    }

    /// Both settings must be non-empty before anything binds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.http.is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        Ok(())
    }

    /// Addresses to try binding, in order. `:PORT` listens on every
    /// interface: dual-stack `[::]:PORT` first, then `0.0.0.0:PORT` for hosts
    /// without IPv6.
    pub fn bind_addresses(&self) -> Vec<String> {
        if self.http.starts_with(':') {
            vec![format!("[::]{}", self.http), format!("0.0.0.0{}", self.http)]
        } else {
            vec![self.http.clone()]
        }
    }
}

fn normalize_arg(arg: OsString) -> OsString {
    let rewritten = match arg.to_str() {
        Some("-http") => Some("--http".to_owned()),
        Some(s) => s.strip_prefix("-http=").map(|value| format!("--http={value}")),
        None => None,
    };
    rewritten.map_or(arg, OsString::from)
}
