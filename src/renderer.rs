//! The [`Renderer`] contract shared by the JSON and template backends.
//!
//! # No partial output
//!
//! A renderer never streams into the transport. Each call renders into a
//! `Vec<u8>` that lives on that call's stack, and only a fully rendered buffer
//! is handed to [`flush`]. A failed render drops its buffer, so a client can
//! never observe a truncated body, and concurrent requests sharing one
//! renderer never share a buffer.

use serde::Serialize;

use crate::error::Error;
use crate::options::Options;
use crate::status::Status;
use crate::transport::{ContentType, Transport};

/// Turns a status code and [`Options`] into response bytes for one format.
///
/// Renderers are built once at startup and shared read-only across requests.
pub trait Renderer: Send + Sync {
    /// Renders `options` and, only on success, writes it with `status`.
    ///
    /// Returns [`Error::TemplateNotFound`], [`Error::RenderExecution`] or
    /// [`Error::Encode`] without touching `w`. [`Error::Transport`] means the
    /// head was written but the body could not be.
    fn render<T: Serialize>(
        &self,
        w: &mut dyn Transport,
        status: Status,
        options: &Options<T>,
    ) -> Result<(), Error>;

    /// Writes a minimal error body carrying `message` with `status`.
    ///
    /// This is the terminal fallback and always writes something.
    fn write_error(&self, w: &mut dyn Transport, message: &str, status: Status);
}

/// Writes the head and a fully rendered body.
pub(crate) fn flush(
    w: &mut dyn Transport,
    status: Status,
    content_type: ContentType,
    body: &[u8],
) -> Result<(), Error> {
    w.set_header("content-type", content_type.as_str());
    w.set_header("x-content-type-options", "nosniff");
    w.write_status(status);
    w.write_body(body).map_err(Error::Transport)
}
