//! Permissive CORS.
//!
//! Any origin may call any route, so a browser dashboard can drive the
//! stub directly. Preflights are answered here and never reach the router,
//! which also keeps them out of the request counters.

use http::{Method, StatusCode};

use crate::request::Request;
use crate::response::Response;

pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
pub const ALLOW_METHODS: &str = "access-control-allow-methods";
pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
pub const MAX_AGE: &str = "access-control-max-age";

/// How long a browser may cache a preflight answer, in seconds.
pub const PREFLIGHT_MAX_AGE_SECONDS: u32 = 600;

/// An `OPTIONS` request announcing the method it wants to use.
/// A bare `OPTIONS` is not a preflight and gets routed like any request.
pub fn is_preflight(req: &Request) -> bool {
    *req.method() == Method::OPTIONS && req.header("access-control-request-method").is_some()
}

/// `204` carrying the full set of allow headers.
pub fn preflight() -> Response {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ALLOW_ORIGIN, "*")
        .header(ALLOW_METHODS, "*")
        .header(ALLOW_HEADERS, "*")
        .header(MAX_AGE, &PREFLIGHT_MAX_AGE_SECONDS.to_string())
        .empty()
}

/// Marks an ordinary response as readable from any origin.
pub fn allow_any_origin(mut res: Response) -> Response {
    res.set_header_if_absent(ALLOW_ORIGIN, "*");
    res
}
