//! Per-request tracing.

use std::future::Future;

use http::Method;
use tokio::time::Instant;
use tracing::{Instrument, info, info_span, warn};

use crate::response::Response;

/// Runs `fut` inside a `request` span and logs its outcome.
///
/// Server errors log at `warn` so simulated failures stand out; everything
/// else logs at `info`. Latency is measured on tokio's clock, so it reads
/// correctly under a paused test runtime.
pub async fn request<F>(method: &Method, path: &str, fut: F) -> Response
where
    F: Future<Output = Response>,
{
    let span = info_span!("request", %method, path);
    let started = Instant::now();
    let res = fut.instrument(span.clone()).await;
    let latency_ms = started.elapsed().as_millis() as u64;
    let status = res.status_code().as_u16();

    span.in_scope(|| {
        if res.status_code().is_server_error() {
            warn!(status, latency_ms, "request failed");
        } else {
            info!(status, latency_ms, "request completed");
        }
    });
    res
}
