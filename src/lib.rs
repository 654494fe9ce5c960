//! # retort
//!
//! Fail-safe HTTP replies. You say what status and what payload; retort renders
//! it as JSON or through an HTML template and writes it, or writes a clean
//! `500` instead. Never half a body.
//!
//! ## The contract
//!
//! - **Render first, write second.** Every reply is rendered into a buffer
//!   owned by that one call. Only a complete buffer reaches the client.
//! - **Failures degrade to a 500.** A missing template, a payload that does not
//!   fit the template, or a payload that cannot be encoded becomes a
//!   well-formed error reply.
//! - **Production hides internals.** With `debug` off the client sees
//!   `Internal Server Error`. With it on, the real error text.
//!
//! What retort does not do: routing, middleware, owning the socket. It writes
//! through a [`Transport`]; [`Response`] is the in-memory one you hand to hyper.
//!
//! ## Quick start
//!
//! ```rust
//! use std::collections::HashMap;
//! use retort::{Engine, JsonRenderer, Options, Response, Status, Template, TemplateRenderer};
//!
//! let json = Engine::new(JsonRenderer);
//! let mut res = Response::new();
//! json.ok(&mut res, Options::new().data(HashMap::from([("id", 42)])));
//! assert_eq!(res.body_str(), r#"{"id":42}"#);
//!
//! let page = Template::parse("hello.html", "<h1>Hello, {{ name }}</h1>")?;
//! let html = Engine::new(TemplateRenderer::new(HashMap::from([("hello.html".to_owned(), page)])));
//!
//! let mut res = Response::new();
//! html.ok(&mut res, Options::new().key("hello.html").data(HashMap::from([("name", "Ada")])));
//! assert_eq!(res.body_str(), "<h1>Hello, Ada</h1>");
//!
//! // Unknown key: a 500, not a panic and not a partial page.
//! let mut res = Response::new();
//! html.ok(&mut res, Options::new().key("missing.html"));
//! assert_eq!(res.status(), Status::InternalServerError);
//! assert_eq!(res.body_str(), "<p>Internal Server Error</p>");
//! # Ok::<(), retort::Error>(())
//! ```

mod engine;
mod error;
mod json;
mod loader;
mod options;
mod renderer;
mod status;
mod template;
mod transport;

pub use engine::{ERROR_REPLIES, Engine, SUCCESS_REPLIES};
pub use error::Error;
pub use json::JsonRenderer;
pub use loader::{Function, Loader};
pub use options::Options;
pub use renderer::Renderer;
pub use status::Status;
pub use template::{EMPTY_TEMPLATE, ERROR_TEMPLATE, Template, TemplateRenderer};
pub use transport::{ContentType, Response, Transport};
