//! HTML template backend.
//!
//! A [`TemplateRenderer`] owns a map of [`Template`]s, each a compiled tera set
//! with a root part and optional named parts. Rendering resolves the map key
//! first and the named part second:
//!
//! ```text
//! Options { key: "users.html", name: None }          → users.html root
//! Options { key: "users.html", name: Some("row") }   → part "row" inside users.html
//! ```
//!
//! Two keys always resolve. [`ERROR_TEMPLATE`] renders error replies and
//! [`EMPTY_TEMPLATE`] renders `204 No Content`. If the caller's map lacks
//! either, a default is injected at construction.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use tera::{Context, Tera};
use tracing::{error, warn};

use crate::error::Error;
use crate::options::Options;
use crate::renderer::{Renderer, flush};
use crate::status::Status;
use crate::transport::{ContentType, Transport};

/// Key of the template used for error replies.
pub const ERROR_TEMPLATE: &str = "error";
/// Key of the template used for `204 No Content` replies.
pub const EMPTY_TEMPLATE: &str = "empty";

const DEFAULT_ERROR_BODY: &str = "<p>{{ Error }}</p>";
const DEFAULT_EMPTY_BODY: &str = "";

// ── Template ──────────────────────────────────────────────────────────────────

/// One compiled template set: a root part plus any number of named parts.
///
/// Sets built with [`parse`](Template::parse) escape HTML in every part,
/// whatever its name.
///
/// ```rust
/// use retort::Template;
///
/// let tmpl = Template::parse("users.html", "<ul>{% for u in users %}{{ u }}{% endfor %}</ul>")?
///     .define("row", "<li>{{ name }}</li>")?;
/// assert_eq!(tmpl.root(), "users.html");
/// # Ok::<(), retort::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Template {
    tera: Tera,
    root: String,
}

impl Template {
    /// Compiles `source` as the root part named `root`.
    pub fn parse(root: impl Into<String>, source: &str) -> Result<Self, Error> {
        let root = root.into();
        let mut tera = Tera::default();
        tera.autoescape_on(vec![""]);
        tera.add_raw_template(&root, source)
            .map_err(|source| Error::Parse { file: PathBuf::from(&root), source })?;
        Ok(Self { tera, root })
    }

    /// Adds a named part. Parts may `{% extends %}` or `{% include %}` parts
    /// defined before them.
    pub fn define(mut self, name: &str, source: &str) -> Result<Self, Error> {
        self.tera.add_raw_template(name, source)
            .map_err(|source| Error::Parse { file: PathBuf::from(name), source })?;
        Ok(self)
    }

    /// Wraps an already configured tera set. `root` must name one of its
    /// templates; a missing root surfaces as a render error.
    pub fn from_tera(tera: Tera, root: impl Into<String>) -> Self {
        Self { tera, root: root.into() }
    }

    /// Name of the root part.
    pub fn root(&self) -> &str { &self.root }

    /// Names of every part, root included.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.tera.get_template_names()
    }

    fn execute(&self, part: Option<&str>, ctx: &Context, buf: &mut Vec<u8>) -> tera::Result<()> {
        self.tera.render_to(part.unwrap_or(&self.root), ctx, buf)
    }
}

// ── TemplateRenderer ──────────────────────────────────────────────────────────

/// Renders [`Options`] through a fixed map of [`Template`]s.
#[derive(Clone, Debug)]
pub struct TemplateRenderer {
    templates: HashMap<String, Template>,
}

#[derive(Serialize)]
struct ErrorData<'a> {
    #[serde(rename = "Error")]
    error: &'a str,
}

impl TemplateRenderer {
    /// Takes ownership of `templates`, adding the default `error` and `empty`
    /// templates where the map has none. Existing entries are kept as given.
    pub fn new(mut templates: HashMap<String, Template>) -> Self {
        for (key, body) in [(ERROR_TEMPLATE, DEFAULT_ERROR_BODY), (EMPTY_TEMPLATE, DEFAULT_EMPTY_BODY)] {
            templates.entry(key.to_owned()).or_insert_with(|| {
                Template::parse(key, body).expect("built-in template compiles")
            });
        }
        Self { templates }
    }

    /// The renderer's template set. Fixed for the renderer's lifetime.
    pub fn templates(&self) -> &HashMap<String, Template> {
        &self.templates
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self { Self::new(HashMap::new()) }
}

/// `null` renders with an empty context; any other non-object shape is an error.
fn context<T: Serialize>(data: &T) -> Result<Context, Error> {
    match serde_json::to_value(data)? {
        serde_json::Value::Null => Ok(Context::new()),
        value => Ok(Context::from_serialize(value)?),
    }
}

impl Renderer for TemplateRenderer {
    fn render<T: Serialize>(
        &self,
        w: &mut dyn Transport,
        status: Status,
        options: &Options<T>,
    ) -> Result<(), Error> {
        let tmpl = self.templates
            .get(&options.key)
            .ok_or_else(|| Error::TemplateNotFound(options.key.clone()))?;
        let ctx = context(&options.data)?;
        let mut buf = Vec::new();
        tmpl.execute(options.part(), &ctx, &mut buf)?;
        flush(w, status, ContentType::Html, &buf)
    }

    fn write_error(&self, w: &mut dyn Transport, message: &str, status: Status) {
        let opts = Options::new()
            .key(ERROR_TEMPLATE)
            .data(ErrorData { error: message });
        match self.render(w, status, &opts) {
            Ok(()) => {}
            Err(Error::Transport(e)) => error!("failed to write error reply: {e}"),
            Err(e) => {
                warn!(error = %e.chain(), "error template failed, writing plain text");
                w.fail(message, status);
            }
        }
    }
}
