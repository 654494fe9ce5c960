//! The reply engine: render, or fall back to a safe `500`.
//!
//! # Write-or-fallback
//!
//! ```text
//! reply_or_error(status, options)
//!   attempt:  renderer.render(status, options) ── Ok ──────────────▶ done
//!                     │ Err(render failure)
//!   fallback: message = debug ? error text : "Internal Server Error"
//!             renderer.write_error(message, 500) ─────────────────▶ done
//! ```
//!
//! Render failures are expected (missing template, payload shape, payload that
//! cannot be encoded) and never reach a client as a broken body. In production
//! (`debug == false`) the client only ever sees the status phrase.
//!
//! Every named reply (`ok`, `created`, `not_found`, ...) is generated from the
//! tables at the bottom of this file and delegates to
//! [`reply_or_error`](Engine::reply_or_error) or [`error`](Engine::error).

use std::backtrace::Backtrace;
use std::fmt;

use serde::Serialize;
use tracing::{error, warn};

use crate::error::Error;
use crate::options::Options;
use crate::renderer::Renderer;
use crate::status::Status;
use crate::template::EMPTY_TEMPLATE;
use crate::transport::Transport;

/// Writes replies through one [`Renderer`].
///
/// Build one per output format at startup and share it (e.g. in an `Arc`)
/// across request handlers.
///
/// ```rust
/// use std::collections::BTreeMap;
/// use retort::{Engine, JsonRenderer, Options, Response, Status};
///
/// let engine = Engine::new(JsonRenderer);
/// let mut res = Response::new();
/// engine.created(&mut res, Options::new().data(BTreeMap::from([("name", "Sherlock")])));
///
/// assert_eq!(res.status(), Status::Created);
/// assert_eq!(res.body_str(), r#"{"name":"Sherlock"}"#);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Engine<R> {
    renderer: R,
}

impl<R: Renderer> Engine<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Renders `options` with `status`, or writes a `500` error reply if
    /// rendering fails.
    pub fn reply_or_error<T: Serialize>(&self, w: &mut dyn Transport, status: Status, options: Options<T>) {
        let err = match self.renderer.render(w, status, &options) {
            Ok(()) => return,
            Err(Error::Transport(e)) => {
                error!(%status, "failed to write reply: {e}");
                return;
            }
            Err(err) => err,
        };

        let detail = err.chain();
        warn!(%status, key = %options.key, error = %detail, "render failed, replying 500");
        let message = if options.debug {
            detail
        } else {
            Status::InternalServerError.reason().to_owned()
        };
        self.renderer.write_error(w, &message, Status::InternalServerError);
    }

    /// Alias of [`reply_or_error`](Engine::reply_or_error).
    pub fn reply<T: Serialize>(&self, w: &mut dyn Transport, status: Status, options: Options<T>) {
        self.reply_or_error(w, status, options)
    }

    /// Writes the renderer's error body with `status` and its reason phrase.
    pub fn error(&self, w: &mut dyn Transport, status: Status) {
        self.renderer.write_error(w, status.reason(), status)
    }

    /// `204 No Content`: `null` for JSON, the `empty` template for HTML.
    pub fn no_content(&self, w: &mut dyn Transport) {
        self.reply_or_error(w, Status::NoContent, Options::new().key(EMPTY_TEMPLATE))
    }

    /// Sets `Allow` to the given methods, then replies `405 Method Not Allowed`.
    ///
    /// Accepts anything string-like, including [`http::Method`].
    pub fn method_not_allowed<I>(&self, w: &mut dyn Transport, allow: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let allow = allow.into_iter()
            .map(|m| m.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(", ");
        w.set_header("allow", &allow);
        self.error(w, Status::MethodNotAllowed)
    }

    /// Logs `err` with a captured backtrace, then replies
    /// `500 Internal Server Error`. The client never sees `err`.
    pub fn internal_server_error(&self, w: &mut dyn Transport, err: impl fmt::Display) {
        error!("{err}\n{}", Backtrace::force_capture());
        self.error(w, Status::InternalServerError)
    }
}

// ── Named replies ─────────────────────────────────────────────────────────────

macro_rules! success_replies {
    ($( $method:ident => $status:ident; )+) => {
        impl<R: Renderer> Engine<R> {
            $(
                #[doc = concat!("Replies with [`Status::", stringify!($status), "`] and `options`.")]
                pub fn $method<T: Serialize>(&self, w: &mut dyn Transport, options: Options<T>) {
                    self.reply_or_error(w, Status::$status, options)
                }
            )+
        }

        /// Every generated success reply: method name and status.
        pub const SUCCESS_REPLIES: &[(&str, Status)] = &[
            $( (stringify!($method), Status::$status), )+
        ];
    };
}

macro_rules! error_replies {
    ($( $method:ident => $status:ident; )+) => {
        impl<R: Renderer> Engine<R> {
            $(
                #[doc = concat!("Replies with [`Status::", stringify!($status), "`] and its reason phrase.")]
                pub fn $method(&self, w: &mut dyn Transport) {
                    self.error(w, Status::$status)
                }
            )+
        }

        /// Every generated error reply: method name and status.
        pub const ERROR_REPLIES: &[(&str, Status)] = &[
            $( (stringify!($method), Status::$status), )+
        ];
    };
}

success_replies! {
    ok                            => Ok;
    created                       => Created;
    accepted                      => Accepted;
    non_authoritative_information => NonAuthoritativeInformation;
    reset_content                 => ResetContent;
    partial_content               => PartialContent;
    multi_status                  => MultiStatus;
    already_reported              => AlreadyReported;
    im_used                       => ImUsed;
}

// 405 and 500 are hand-written above: they take extra arguments.
error_replies! {
    bad_request                     => BadRequest;
    unauthorized                    => Unauthorized;
    payment_required                => PaymentRequired;
    forbidden                       => Forbidden;
    not_found                       => NotFound;
    not_acceptable                  => NotAcceptable;
    proxy_authentication_required   => ProxyAuthenticationRequired;
    request_timeout                 => RequestTimeout;
    conflict                        => Conflict;
    gone                            => Gone;
    length_required                 => LengthRequired;
    precondition_failed             => PreconditionFailed;
    content_too_large               => ContentTooLarge;
    uri_too_long                    => UriTooLong;
    unsupported_media_type          => UnsupportedMediaType;
    range_not_satisfiable           => RangeNotSatisfiable;
    expectation_failed              => ExpectationFailed;
    im_a_teapot                     => ImATeapot;
    misdirected_request             => MisdirectedRequest;
    unprocessable_content           => UnprocessableContent;
    locked                          => Locked;
    failed_dependency               => FailedDependency;
    too_early                       => TooEarly;
    upgrade_required                => UpgradeRequired;
    precondition_required           => PreconditionRequired;
    too_many_requests               => TooManyRequests;
    request_header_fields_too_large => RequestHeaderFieldsTooLarge;
    unavailable_for_legal_reasons   => UnavailableForLegalReasons;
    not_implemented                 => NotImplemented;
    bad_gateway                     => BadGateway;
    service_unavailable             => ServiceUnavailable;
    gateway_timeout                 => GatewayTimeout;
    http_version_not_supported      => HttpVersionNotSupported;
    variant_also_negotiates         => VariantAlsoNegotiates;
    insufficient_storage            => InsufficientStorage;
    loop_detected                   => LoopDetected;
    not_extended                    => NotExtended;
    network_authentication_required => NetworkAuthenticationRequired;
}
