//! Per-call description of what to render.

/// What a single reply should render.
///
/// The same `Options` works against either renderer: the JSON renderer ignores
/// `key` and `name`, the template renderer requires `key`.
///
/// ```rust
/// use std::collections::BTreeMap;
///
/// use retort::{Options, Renderer, Response, Status, Template, TemplateRenderer};
///
/// let profile = Template::parse("profile.html", "<main>{{ name }}</main>")?
///     .define("card", "<div>{{ name }}</div>")?;
/// let r = TemplateRenderer::new([("profile.html".to_owned(), profile)].into());
///
/// let opts = Options::new()
///     .key("profile.html")
///     .name("card")
///     .data(BTreeMap::from([("name", "Sherlock")]))
///     .debug(cfg!(debug_assertions));
/// let mut res = Response::new();
/// r.render(&mut res, Status::Ok, &opts)?;
/// assert_eq!(res.body_str(), "<div>Sherlock</div>");
/// # Ok::<(), retort::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Options<T = ()> {
    /// Template lookup key. Empty means no template is bound.
    pub key: String,
    /// Named part of the template to execute instead of its root.
    pub name: Option<String>,
    /// Payload handed to the renderer.
    pub data: T,
    /// Expose real render errors to the client instead of a status phrase.
    pub debug: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> Options<T> {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the payload, changing its type.
    pub fn data<U>(self, data: U) -> Options<U> {
        Options { key: self.key, name: self.name, data, debug: self.debug }
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The named part, treating `Some("")` like `None`.
    pub(crate) fn part(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}
