//! JSON backend.

use serde::Serialize;
use tracing::error;

use crate::error::Error;
use crate::options::Options;
use crate::renderer::{Renderer, flush};
use crate::status::Status;
use crate::transport::{ContentType, Transport};

/// Renders `Options::data` as JSON. `key` and `name` are ignored.
///
/// Errors are written as `{"error":"<message>"}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Renderer for JsonRenderer {
    fn render<T: Serialize>(
        &self,
        w: &mut dyn Transport,
        status: Status,
        options: &Options<T>,
    ) -> Result<(), Error> {
        let buf = serde_json::to_vec(&options.data)?;
        flush(w, status, ContentType::Json, &buf)
    }

    fn write_error(&self, w: &mut dyn Transport, message: &str, status: Status) {
        let opts = Options::new().data(ErrorBody { error: message });
        match self.render(w, status, &opts) {
            Ok(()) => {}
            Err(Error::Transport(e)) => error!("failed to write error reply: {e}"),
            // A struct of one string cannot fail to encode.
            Err(e) => w.fail(&e.to_string(), status),
        }
    }
}
