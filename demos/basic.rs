//! Minimal retort demo: JSON and HTML replies served through hyper.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/
//!   curl -i http://localhost:3000/users/42
//!   curl -i -X DELETE http://localhost:3000/users/42
//!   curl -i -X PUT http://localhost:3000/users/42      # 405 with Allow
//!   curl -i http://localhost:3000/broken               # 500, error text in debug builds

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use retort::{Engine, JsonRenderer, Options, Response, Template, TemplateRenderer};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info};

struct App {
    json: Engine<JsonRenderer>,
    html: Engine<TemplateRenderer>,
}

#[derive(Serialize)]
struct User {
    id: u32,
    name: &'static str,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let index = Template::parse("index.html", "<h1>Hello, {{ name }}</h1>")?;
    let app = Arc::new(App {
        json: Engine::new(JsonRenderer),
        html: Engine::new(TemplateRenderer::new(HashMap::from([("index.html".to_owned(), index)]))),
    });

    let addr: SocketAddr = "0.0.0.0:3000".parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "retort demo listening");

    let mut tasks = tokio::task::JoinSet::new();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };
                let app = Arc::clone(&app);
                tasks.spawn(async move {
                    let svc = service_fn(move |req| {
                        let app = Arc::clone(&app);
                        async move { dispatch(&app, req) }
                    });
                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), svc)
                        .await
                    {
                        error!(%peer, "connection error: {e}");
                    }
                });
            }

            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}
    Ok(())
}

fn dispatch(
    app: &App,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let mut res = Response::new();
    let debug = cfg!(debug_assertions);

    match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => {
            app.html.ok(&mut res, Options::new().key("index.html").data(HashMap::from([("name", "world")])))
        }
        (&Method::GET, "/users/42") => {
            app.json.ok(&mut res, Options::new().data(User { id: 42, name: "alice" }))
        }
        (&Method::DELETE, "/users/42") => app.json.no_content(&mut res),
        (_, "/users/42") => app.json.method_not_allowed(&mut res, [Method::GET, Method::DELETE]),
        (&Method::GET, "/broken") => {
            app.html.ok(&mut res, Options::new().key("missing.html").debug(debug))
        }
        _ => app.json.not_found(&mut res),
    }

    Ok(res.into_http())
}
