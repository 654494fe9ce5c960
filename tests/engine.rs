use std::collections::{BTreeMap, HashMap};
use std::io;

use retort::{
    EMPTY_TEMPLATE, ERROR_REPLIES, ERROR_TEMPLATE, Engine, JsonRenderer, Options, Response, Status,
    Template, TemplateRenderer, Transport,
};
use serde::Serialize;
use serde_json::{Value, json};

fn html(templates: Vec<Template>) -> Engine<TemplateRenderer> {
    let map = templates.into_iter().map(|t| (t.root().to_owned(), t)).collect();
    Engine::new(TemplateRenderer::new(map))
}

fn profile() -> Engine<TemplateRenderer> {
    let page = Template::parse("profile.html", "<h1>{{ name }}</h1><p>{{ bio }}</p>")
        .unwrap()
        .define("card", "<div>{{ name }}</div>")
        .unwrap();
    html(vec![page])
}

#[derive(Serialize)]
struct Person {
    name: &'static str,
    bio: &'static str,
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn empty_key_on_empty_map_masks_error_in_production() {
    let engine = html(vec![]);
    let mut res = Response::new();
    engine.reply_or_error(&mut res, Status::Ok, Options::new().key(""));
    assert_eq!(res.status(), Status::InternalServerError);
    assert_eq!(res.body_str(), "<p>Internal Server Error</p>");
}

#[test]
fn empty_key_on_empty_map_shows_error_in_debug() {
    let engine = html(vec![]);
    let mut res = Response::new();
    engine.reply_or_error(&mut res, Status::Ok, Options::new().key("").debug(true));
    assert_eq!(res.status(), Status::InternalServerError);
    // quotes are HTML-escaped by the error template
    assert_eq!(res.body_str(), "<p>no such template &#x27;&#x27;</p>");
}

#[test]
fn json_created() {
    let engine = Engine::new(JsonRenderer);
    let mut res = Response::new();
    engine.reply_or_error(
        &mut res,
        Status::Created,
        Options::new().data(BTreeMap::from([("name", "Sherlock")])),
    );
    assert_eq!(res.status(), Status::Created);
    assert_eq!(res.body_str(), r#"{"name":"Sherlock"}"#);
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(res.header("x-content-type-options"), Some("nosniff"));
}

#[test]
fn method_not_allowed_sets_allow_before_body() {
    let mut res = Response::new();
    Engine::new(JsonRenderer).method_not_allowed(&mut res, ["GET", "POST"]);
    assert_eq!(res.status(), Status::MethodNotAllowed);
    assert_eq!(res.header("allow"), Some("GET, POST"));
    assert_eq!(res.body_str(), r#"{"error":"Method Not Allowed"}"#);

    let mut res = Response::new();
    html(vec![]).method_not_allowed(&mut res, [http::Method::GET, http::Method::POST]);
    assert_eq!(res.status(), Status::MethodNotAllowed);
    assert_eq!(res.header("allow"), Some("GET, POST"));
    assert_eq!(res.body_str(), "<p>Method Not Allowed</p>");
}

#[test]
fn missing_field_never_yields_partial_html() {
    let engine = profile();
    let mut res = Response::new();
    // `name` renders before `bio` is found missing
    engine.ok(&mut res, Options::new().key("profile.html").data(BTreeMap::from([("name", "Ada")])));
    assert_eq!(res.status(), Status::InternalServerError);
    assert_eq!(res.body_str(), "<p>Internal Server Error</p>");
    assert!(!res.body_str().contains("<h1>"));
}

#[test]
fn no_content_per_renderer() {
    let mut res = Response::new();
    Engine::new(JsonRenderer).no_content(&mut res);
    assert_eq!(res.status(), Status::NoContent);
    assert_eq!(res.body_str(), "null");

    let mut res = Response::new();
    html(vec![]).no_content(&mut res);
    assert_eq!(res.status(), Status::NoContent);
    assert_eq!(res.body_str(), "");
    assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));
}

// ── Properties ────────────────────────────────────────────────────────────────

#[test]
fn debug_flag_controls_transparency() {
    let failing: Vec<Options<Value>> = vec![
        Options::new().key("nope.html").data(Value::Null),
        Options::new().key("profile.html").data(json!({ "name": "x" })),
        Options::new().key("profile.html").name("missing-part").data(json!({ "name": "x" })),
        Options::new().key("profile.html").data(json!([1, 2])),
    ];
    let engine = profile();
    for opts in failing {
        let label = format!("{}/{:?}", opts.key, opts.name);

        let mut res = Response::new();
        engine.reply_or_error(&mut res, Status::Ok, opts.clone().debug(false));
        assert_eq!(res.status(), Status::InternalServerError, "{label}");
        assert_eq!(res.body_str(), "<p>Internal Server Error</p>", "{label}");

        let mut res = Response::new();
        engine.reply_or_error(&mut res, Status::Ok, opts.debug(true));
        assert_eq!(res.status(), Status::InternalServerError, "{label}");
        assert_ne!(res.body_str(), "<p>Internal Server Error</p>", "{label}");
        assert!(res.body_str().starts_with("<p>"), "{label}");
    }
}

#[test]
fn json_encode_failure_is_masked_or_exposed() {
    let engine = Engine::new(JsonRenderer);
    let bad = BTreeMap::from([((1, 2), "tuple key")]);

    let mut res = Response::new();
    engine.ok(&mut res, Options::new().data(&bad));
    assert_eq!(res.status(), Status::InternalServerError);
    assert_eq!(res.body_str(), r#"{"error":"Internal Server Error"}"#);

    let mut res = Response::new();
    engine.ok(&mut res, Options::new().data(&bad).debug(true));
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("failed to encode payload"), "{message}");
    assert!(message.contains("key must be a string"), "{message}");
}

#[test]
fn json_round_trip() {
    let payloads = [
        json!(null),
        json!(true),
        json!(-17),
        json!(2.5),
        json!("quote \" and <tag>"),
        json!([1, "two", { "three": [3] }]),
        json!({ "name": "Sherlock", "address": { "street": "Baker", "no": 221 } }),
    ];
    let engine = Engine::new(JsonRenderer);
    for payload in payloads {
        let mut res = Response::new();
        engine.ok(&mut res, Options::new().data(&payload));
        let parsed: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(parsed, payload);
    }
}

#[test]
fn struct_payloads_render_in_both_formats() {
    let person = Person { name: "Ada", bio: "Analyst" };

    let mut res = Response::new();
    profile().ok(&mut res, Options::new().key("profile.html").data(&person));
    assert_eq!(res.body_str(), "<h1>Ada</h1><p>Analyst</p>");

    let mut res = Response::new();
    profile().ok(&mut res, Options::new().key("profile.html").name("card").data(&person));
    assert_eq!(res.body_str(), "<div>Ada</div>");

    let mut res = Response::new();
    Engine::new(JsonRenderer).ok(&mut res, Options::new().key("profile.html").data(&person));
    assert_eq!(res.body_str(), r#"{"name":"Ada","bio":"Analyst"}"#);
}

#[test]
fn defaults_present_and_error_always_renders() {
    let engine = html(vec![]);
    let keys: Vec<_> = engine.renderer().templates().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&ERROR_TEMPLATE));
    assert!(keys.contains(&EMPTY_TEMPLATE));

    for status in [Status::BadRequest, Status::NotFound, Status::ServiceUnavailable] {
        let mut res = Response::new();
        engine.error(&mut res, status);
        assert_eq!(res.status(), status);
        assert_eq!(res.body_str(), format!("<p>{}</p>", status.reason()));
    }
}

#[test]
fn custom_error_template_is_used_for_fallback() {
    let custom = Template::parse(ERROR_TEMPLATE, "<section class=\"err\">{{ Error }}</section>").unwrap();
    let engine = Engine::new(TemplateRenderer::new(HashMap::from([(ERROR_TEMPLATE.to_owned(), custom)])));
    let mut res = Response::new();
    engine.ok(&mut res, Options::new().key("gone.html"));
    assert_eq!(res.body_str(), "<section class=\"err\">Internal Server Error</section>");
}

// ── Named replies ─────────────────────────────────────────────────────────────

#[test]
fn named_error_replies() {
    let json = Engine::new(JsonRenderer);
    let page = html(vec![]);
    let cases: [(fn(&Engine<JsonRenderer>, &mut Response), fn(&Engine<TemplateRenderer>, &mut Response), Status); 5] = [
        (|e, w| e.bad_request(w), |e, w| e.bad_request(w), Status::BadRequest),
        (|e, w| e.unauthorized(w), |e, w| e.unauthorized(w), Status::Unauthorized),
        (|e, w| e.forbidden(w), |e, w| e.forbidden(w), Status::Forbidden),
        (|e, w| e.not_found(w), |e, w| e.not_found(w), Status::NotFound),
        (|e, w| e.too_many_requests(w), |e, w| e.too_many_requests(w), Status::TooManyRequests),
    ];
    for (j, h, status) in cases {
        let mut res = Response::new();
        j(&json, &mut res);
        assert_eq!(res.status(), status);
        assert_eq!(res.body_str(), format!(r#"{{"error":"{}"}}"#, status.reason()));

        let mut res = Response::new();
        h(&page, &mut res);
        assert_eq!(res.status(), status);
        assert_eq!(res.body_str(), format!("<p>{}</p>", status.reason()));
    }
}

#[test]
fn every_error_table_entry_writes_its_status() {
    let engine = Engine::new(JsonRenderer);
    for (name, status) in ERROR_REPLIES {
        let mut res = Response::new();
        engine.error(&mut res, *status);
        assert_eq!(res.status(), *status, "{name}");
    }
}

#[test]
fn internal_server_error_hides_the_cause() {
    let err = io::Error::other("db password rejected");
    let mut res = Response::new();
    Engine::new(JsonRenderer).internal_server_error(&mut res, &err);
    assert_eq!(res.status(), Status::InternalServerError);
    assert_eq!(res.body_str(), r#"{"error":"Internal Server Error"}"#);
}

#[test]
fn named_success_replies_keep_status() {
    let engine = Engine::new(JsonRenderer);
    let mut res = Response::new();
    engine.accepted(&mut res, Options::new().data(json!({ "queued": true })));
    assert_eq!(res.status(), Status::Accepted);

    let mut res = Response::new();
    engine.partial_content(&mut res, Options::new().data(json!([1])));
    assert_eq!(res.status(), Status::PartialContent);
}

// ── Transport failures ────────────────────────────────────────────────────────

/// Accepts the head, then fails every body write.
#[derive(Default)]
struct Disconnected {
    status_writes: Vec<Status>,
    body_attempts: usize,
}

impl Transport for Disconnected {
    fn set_header(&mut self, _: &str, _: &str) {}
    fn write_status(&mut self, status: Status) { self.status_writes.push(status) }
    fn write_body(&mut self, _: &[u8]) -> io::Result<()> {
        self.body_attempts += 1;
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
    }
}

#[test]
fn transport_failure_is_not_masked_by_a_fallback() {
    let mut w = Disconnected::default();
    Engine::new(JsonRenderer).ok(&mut w, Options::new().data(json!({ "a": 1 })));
    assert_eq!(w.status_writes, [Status::Ok]);
    assert_eq!(w.body_attempts, 1);
}

#[test]
fn render_failure_never_writes_the_original_status() {
    let mut w = Disconnected::default();
    profile().ok(&mut w, Options::new().key("profile.html"));
    assert_eq!(w.status_writes, [Status::InternalServerError]);
}

#[test]
fn engine_is_shareable_across_threads() {
    let engine = std::sync::Arc::new(profile());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = std::sync::Arc::clone(&engine);
            std::thread::spawn(move || {
                let name = format!("user{i}");
                let mut res = Response::new();
                let data = BTreeMap::from([("name", name.as_str()), ("bio", "-")]);
                engine.ok(&mut res, Options::new().key("profile.html").data(data));
                assert_eq!(res.body_str(), format!("<h1>{name}</h1><p>-</p>"));
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}
