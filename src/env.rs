//! Prefix-filtered environment snapshot.
//!
//! The snapshot is taken once, before the listener binds, and handed to the
//! request handler behind an `Arc`. Nothing re-reads the live environment
//! while the server is running.
//!
//! ```text
//! CONFIG_FOO=bar    ──┐
//! CONFIG_BAZ=a=b    ──┼─ prefix "CONFIG_" ─▶ { "BAZ": "a=b", "FOO": "bar" }
//! HOME=/root        ──┘   (discarded)
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

/// An immutable `name → value` mapping built from the process environment.
///
/// Keys have the prefix stripped. Iteration is in lexical key order so the
/// rendered output is stable across runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilteredEnv {
    vars: BTreeMap<String, String>,
}

impl FilteredEnv {
    /// Snapshots the current process environment.
    ///
    /// Entries whose name or value is not valid UTF-8 are skipped.
    pub fn capture(prefix: &str) -> Self {
        let pairs = std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)));
        Self::from_pairs(prefix, pairs)
    }

    /// Builds the mapping from raw `NAME=VALUE` strings.
    ///
    /// The name ends at the first `=`, so values may themselves contain `=`.
    /// Strings without any `=` are ignored. When two entries strip to the
    /// same key, the later one wins.
    pub fn from_entries<I, S>(prefix: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vars = BTreeMap::new();
        for entry in entries {
            let Some((name, value)) = entry.as_ref().split_once('=') else {
                continue;
            };
            if let Some(key) = name.strip_prefix(prefix) {
                vars.insert(key.to_owned(), value.to_owned());
            }
        }
        Self { vars }
    }

    /// Builds the mapping from already-split `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(prefix: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut vars = BTreeMap::new();
        for (name, value) in pairs {
            if let Some(key) = name.as_ref().strip_prefix(prefix) {
                vars.insert(key.to_owned(), value.into());
            }
        }
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.vars.len() }
    pub fn is_empty(&self) -> bool { self.vars.is_empty() }

    /// Iterates entries in lexical key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
