//! Outgoing HTTP response type.
//!
//! A [`Response`] is a status, a header map and a fully buffered body. The
//! snapshot is small and already in memory, so nothing here streams.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;

use crate::negotiate::MediaType;

// ── ContentType ───────────────────────────────────────────────────────────────

/// `Content-Type` values this server emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    Json,     // application/json
    Text,     // text/plain
    TextUtf8, // text/plain; charset=utf-8  (error bodies)
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json     => "application/json",
            Self::Text     => "text/plain",
            Self::TextUtf8 => "text/plain; charset=utf-8",
        }
    }

    fn header_value(self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

impl From<MediaType> for ContentType {
    fn from(media_type: MediaType) -> Self {
        match media_type {
            MediaType::TextPlain => Self::Text,
            MediaType::Json      => Self::Json,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use envsnap::{ContentType, Response};
/// use http::StatusCode;
///
/// Response::bytes(ContentType::Json, b"{}\n".to_vec());
///
/// Response::builder()
///     .status(StatusCode::INTERNAL_SERVER_ERROR)
///     .header(http::header::X_CONTENT_TYPE_OPTIONS, "nosniff")
///     .bytes(ContentType::TextUtf8, b"boom\n".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: HeaderMap,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK` with the given content type.
    pub fn bytes(content_type: ContentType, body: Vec<u8>) -> Self {
        Self::builder().bytes(content_type, body)
    }

    /// Plain-text error in the shape of a classic `http.Error` reply:
    /// message plus newline, `charset=utf-8`, and `nosniff`.
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::builder()
            .status(status)
            .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
            .bytes(ContentType::TextUtf8, format!("{message}\n").into_bytes())
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }

    /// Converts into the hyper response type.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: HeaderName, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }

    /// Terminate with a typed body.
    pub fn bytes(mut self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.headers.insert(CONTENT_TYPE, content_type.header_value());
        Response { body, headers: self.headers, status: self.status }
    }
}
