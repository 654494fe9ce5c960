//! Builds a [`Template`] map from files on disk.
//!
//! ```rust,no_run
//! use retort::{Loader, TemplateRenderer};
//!
//! let templates = Loader::new("templates")
//!     .pattern("pages/*.html")
//!     .base("base.html")
//!     .partials("partials/*.html")
//!     .function("year", |_args| Ok(tera::Value::from(2026)))
//!     .load()?;
//! let renderer = TemplateRenderer::new(templates);
//! # Ok::<(), retort::Error>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tera::{Tera, Value};
use tracing::debug;

use crate::error::Error;
use crate::template::Template;

/// Helper callable from template bodies as `{{ name(arg=value) }}`.
pub type Function = Arc<dyn Fn(&HashMap<String, Value>) -> tera::Result<Value> + Send + Sync>;

/// Fluent template discovery.
///
/// Every file matching `pattern` under `dir` becomes one [`Template`], keyed by
/// its file name (`pages/home.html` → `home.html`). The optional base layout
/// and every partial are compiled into each set under their file names, so
/// pages can `{% extends %}` or `{% include %}` them and a reply can render a
/// partial on its own through `Options::name`.
pub struct Loader {
    dir: PathBuf,
    pattern: String,
    base: Option<PathBuf>,
    partials: Option<String>,
    functions: Vec<(String, Function)>,
}

impl Loader {
    /// Discovers `*.html` directly under `dir` unless told otherwise.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pattern: "*.html".to_owned(),
            base: None,
            partials: None,
            functions: Vec::new(),
        }
    }

    /// Glob for page templates, relative to the loader's directory.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Shared layout, relative to the loader's directory. Registered under its
    /// file name, e.g. `{% extends "base.html" %}`.
    pub fn base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Glob for named parts, relative to the loader's directory. Each match is
    /// added to every page's set under its file name. Files matching both this
    /// and the page pattern are treated as partials only.
    pub fn partials(mut self, pattern: impl Into<String>) -> Self {
        self.partials = Some(pattern.into());
        self
    }

    /// Registers a helper function on every compiled set.
    pub fn function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&HashMap<String, Value>) -> tera::Result<Value> + Send + Sync + 'static,
    {
        self.functions.push((name.into(), Arc::new(f)));
        self
    }

    /// Compiles every matching file.
    pub fn load(self) -> Result<HashMap<String, Template>, Error> {
        let base = match &self.base {
            Some(b) => {
                let path = self.dir.join(b);
                if !path.is_file() {
                    return Err(Error::Io {
                        path,
                        source: io::Error::new(io::ErrorKind::NotFound, "base template not found"),
                    });
                }
                Some(path)
            }
            None => None,
        };
        let partials = match &self.partials {
            Some(p) => files_under(&self.dir, p)?,
            None => Vec::new(),
        };

        let mut templates = HashMap::new();
        for path in files_under(&self.dir, &self.pattern)? {
            if Some(&path) == base.as_ref() || partials.contains(&path) {
                continue;
            }
            let name = file_name(&path)?;
            let tmpl = self.compile(&name, &path, base.as_deref(), &partials)?;
            debug!(template = %name, path = %path.display(), "template loaded");
            templates.insert(name, tmpl);
        }
        Ok(templates)
    }

    fn compile(
        &self,
        name: &str,
        page: &Path,
        base: Option<&Path>,
        partials: &[PathBuf],
    ) -> Result<Template, Error> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![""]);
        for (fname, f) in &self.functions {
            let f = Arc::clone(f);
            tera.register_function(fname, move |args: &HashMap<String, Value>| f(args));
        }

        // One file per call so a parse error names the file that broke.
        // Base first: partials and the page may extend it.
        for path in base.into_iter().chain(partials.iter().map(PathBuf::as_path)) {
            add_file(&mut tera, path, &file_name(path)?)?;
        }
        add_file(&mut tera, page, name)?;
        Ok(Template::from_tera(tera, name))
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("dir", &self.dir)
            .field("pattern", &self.pattern)
            .field("base", &self.base)
            .field("partials", &self.partials)
            .field("functions", &self.functions.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

fn add_file(tera: &mut Tera, path: &Path, name: &str) -> Result<(), Error> {
    tera.add_template_file(path, Some(name))
        .map_err(|source| Error::Parse { file: path.to_path_buf(), source })
}

/// Regular files matching `pattern` under `dir`. The directory is escaped so
/// glob metacharacters in its name match literally.
fn files_under(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let dir_str = dir.to_str().ok_or_else(|| Error::Io {
        path: dir.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "template directory is not valid UTF-8"),
    })?;
    let full = Path::new(&glob::Pattern::escape(dir_str)).join(pattern);

    let mut files = Vec::new();
    for entry in glob::glob(&full.to_string_lossy())? {
        let path = entry.map_err(|e| Error::Io {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

fn file_name(path: &Path) -> Result<String, Error> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })
}
