//! The one request handler: renders the snapshot in the negotiated format.
//!
//! ```text
//! Request ──▶ negotiate(Accept) ──┬─ text/plain        ──▶ 200 KEY=VALUE\n…
//!                                 ├─ application/json  ──▶ 200 {"KEY":"VALUE",…}\n
//!                                 └─ error             ──▶ 500 <message>\n
//! ```
//!
//! A failed negotiation answers `500`, not `406`.

use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, error};

use crate::env::FilteredEnv;
use crate::negotiate::{MediaType, negotiate};
use crate::request::Request;
use crate::response::Response;

/// Serves a [`FilteredEnv`] to every request, whatever its method or path.
///
/// Cloning is one `Arc` increment; every connection task gets its own clone
/// and reads the same immutable snapshot.
#[derive(Clone, Debug)]
pub struct EnvHandler {
    env: Arc<FilteredEnv>,
}

impl EnvHandler {
    pub fn new(env: FilteredEnv) -> Self {
        Self { env: Arc::new(env) }
    }

    pub fn handle(&self, req: &Request) -> Response {
        let accept = req.accept();
        match negotiate(accept.as_deref()) {
            Ok(media_type) => {
                debug!(method = req.method(), path = req.path(), %media_type, "serving snapshot");
                self.render(media_type)
            }
            Err(e) => {
                debug!(method = req.method(), path = req.path(), accept = ?accept, "negotiation failed: {e}");
                Response::error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        }
    }

    /// Renders the snapshot as `media_type` with status `200`.
    pub fn render(&self, media_type: MediaType) -> Response {
        match media_type {
            MediaType::TextPlain => Response::bytes(media_type.into(), self.plain_text()),
            MediaType::Json => match serde_json::to_vec(&*self.env) {
                Ok(mut body) => {
                    body.push(b'\n');
                    Response::bytes(media_type.into(), body)
                }
                Err(e) => {
                    error!("json encoding failed: {e}");
                    Response::error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
                }
            },
        }
    }

    /// One unescaped `KEY=VALUE\n` line per entry.
    fn plain_text(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (key, value) in self.env.iter() {
            body.extend_from_slice(key.as_bytes());
            body.push(b'=');
            body.extend_from_slice(value.as_bytes());
            body.push(b'\n');
        }
        body
    }
}
