//! Incoming HTTP request type.

use http::header::ACCEPT;
use http::request::Parts;

/// The parts of an incoming request the responder looks at.
///
/// The body is never read; every request is answered the same way regardless
/// of method, path or payload.
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: &str, path: &str, headers: Vec<(String, String)>) -> Self {
        Self { method: method.to_owned(), path: path.to_owned(), headers }
    }

    /// Header values that are not valid UTF-8 are decoded lossily, so they
    /// still reach negotiation and fail there.
    pub(crate) fn from_parts(parts: &Parts) -> Self {
        let headers = parts.headers.iter()
            .map(|(name, value)| {
                (name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
            })
            .collect();
        Self::new(parts.method.as_str(), parts.uri.path(), headers)
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }

    /// All `Accept` field values folded into one comma-separated list, or
    /// `None` when the client sent none.
    pub fn accept(&self) -> Option<String> {
        let values: Vec<&str> = self.headers.iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(ACCEPT.as_str()))
            .map(|(_, v)| v.as_str())
            .collect();
        (!values.is_empty()).then(|| values.join(", "))
    }
}
