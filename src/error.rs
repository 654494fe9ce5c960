//! Unified error type.

use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The error type returned by retort's fallible operations.
///
/// Render failures ([`TemplateNotFound`](Error::TemplateNotFound),
/// [`RenderExecution`](Error::RenderExecution), [`Encode`](Error::Encode)) never
/// reach a client as-is: the [`Engine`](crate::Engine) turns them into a
/// well-formed `500` reply. [`Transport`](Error::Transport) means the channel
/// itself is broken and can only be logged.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested key is absent from the template map.
    #[error("no such template '{0}'")]
    TemplateNotFound(String),

    /// A template was found but failed to execute against the payload.
    #[error("template execution failed: {0}")]
    RenderExecution(#[from] tera::Error),

    /// The payload could not be serialised.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writing the rendered body to the client failed.
    #[error("transport write failed: {0}")]
    Transport(#[source] io::Error),

    /// A template file could not be compiled.
    #[error("failed to parse template {file}: {source}")]
    Parse { file: PathBuf, source: tera::Error },

    /// The template discovery pattern is not a valid glob.
    #[error("invalid template pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Filesystem error while discovering templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("unknown status code {0}")]
    UnknownStatus(u16),
}

impl Error {
    /// True for the failures the engine recovers from with a fallback reply.
    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            Self::TemplateNotFound(_) | Self::RenderExecution(_) | Self::Encode(_)
        )
    }

    /// The error's message followed by every `source()` below it, joined by
    /// `": "`. tera keeps the useful part (which variable was missing) in the
    /// chain, not in the top-level message.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !out.contains(&text) {
                let _ = write!(out, ": {text}");
            }
            source = cause.source();
        }
        out
    }
}
