//! The HTTP primitive retort writes through, and an in-memory implementation.
//!
//! retort does not own a socket. It talks to whatever your server hands it
//! through [`Transport`]: set a header, write the status line, write the body.
//! [`Response`] is the implementation shipped with the crate. It records the
//! reply and converts into an [`http::Response`] for hyper.

use std::io;

use bytes::Bytes;
use http_body_util::Full;
use tracing::{debug, error};

use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values retort writes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Html, // text/html; charset=utf-8
    Json, // application/json
    Text, // text/plain; charset=utf-8
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json",
            Self::Text => "text/plain; charset=utf-8",
        }
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// Write side of one HTTP exchange.
///
/// Ordering follows the wire: headers, then the status line, then the body.
/// Implementations drop headers set after [`write_status`](Transport::write_status).
pub trait Transport {
    /// Sets (replaces) a response header.
    fn set_header(&mut self, name: &str, value: &str);

    /// Writes the status line. Only the first call has any effect.
    fn write_status(&mut self, status: Status);

    /// Appends bytes to the body, writing a `200 OK` status line first if none
    /// has been written.
    fn write_body(&mut self, body: &[u8]) -> io::Result<()>;

    /// Minimal plain-text reply, used only when retort's own error rendering
    /// could not produce output.
    fn fail(&mut self, message: &str, status: Status) {
        self.set_header("content-type", ContentType::Text.as_str());
        self.set_header("x-content-type-options", "nosniff");
        self.write_status(status);
        if let Err(e) = self.write_body(format!("{message}\n").as_bytes()) {
            error!("failed to write plain-text fallback: {e}");
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response, recorded in memory.
///
/// ```rust
/// use retort::{Response, Status, Transport};
///
/// let mut res = Response::new();
/// res.set_header("content-type", "application/json");
/// res.write_status(Status::Created);
/// res.write_body(br#"{"id":42}"#).unwrap();
///
/// assert_eq!(res.status(), Status::Created);
/// assert_eq!(res.header("Content-Type"), Some("application/json"));
/// assert_eq!(res.body_str(), r#"{"id":42}"#);
/// ```
#[derive(Debug, Default)]
pub struct Response {
    body: Vec<u8>,
    headers: Vec<(String, String)>,
    status: Option<Status>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// The written status, or `200 OK` if no status line was written.
    pub fn status(&self) -> Status {
        self.status.unwrap_or(Status::Ok)
    }

    /// Whether a status line has been written.
    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Converts into a hyper-ready [`http::Response`].
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let status = http::StatusCode::from_u16(self.status().code())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = status;
        let headers = res.headers_mut();
        for (name, value) in self.headers {
            match (
                http::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => debug!(header = %name, "dropping invalid header"),
            }
        }
        res
    }
}

impl Transport for Response {
    fn set_header(&mut self, name: &str, value: &str) {
        if self.is_committed() {
            debug!(header = name, "status already written, header dropped");
            return;
        }
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_owned(),
            None => self.headers.push((name.to_owned(), value.to_owned())),
        }
    }

    fn write_status(&mut self, status: Status) {
        match self.status {
            Some(prev) => debug!(%prev, ignored = %status, "superfluous status write"),
            None => self.status = Some(status),
        }
    }

    fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
        if self.status.is_none() {
            self.status = Some(Status::Ok);
        }
        self.body.extend_from_slice(body);
        Ok(())
    }
}
