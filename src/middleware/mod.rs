//! Middleware layer.
//!
//! Cross-cutting concerns that wrap every request the router sees.
//!
//! - [`cors`]: permissive CORS headers and preflight answers
//! - [`trace`]: one log line per request with method, path, status, latency

pub mod cors;
pub mod trace;
