//! Failure injection: probabilistic 500s and advertised degradation.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ApiError, pause, wait_for};
use crate::app::AppState;
use crate::request::Request;
use crate::response::Json;

/// Upper bound on the processing delay `/sometimes-fail` adds to successes.
pub const MAX_PROCESSING_DELAY_SECONDS: f64 = 10.0;

pub const DEFAULT_BURST_SECONDS: u32 = 30;
pub const MAX_BURST_SECONDS: u32 = 300;

// ── /sometimes-fail ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FailParams {
    failure_rate: Option<f64>,
    delay: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FailReport {
    pub status: &'static str,
    pub result: &'static str,
    pub message: &'static str,
    pub failure_rate: f64,
    pub delay_seconds: f64,
}

/// `GET /sometimes-fail?failure_rate=R&delay=S`
///
/// One independent draw per request decides the outcome. A failure answers
/// at once; a success first waits out the optional processing delay `S`.
pub async fn sometimes_fail(req: Request, state: AppState) -> Result<Json<FailReport>, ApiError> {
    let params: FailParams = req.query()?;
    let failure_rate = params.failure_rate.unwrap_or(state.config.default_failure_rate);
    let delay = params.delay.unwrap_or(0.0);

    if !(0.0..=1.0).contains(&failure_rate) {
        return Err(ApiError::BadRequest(format!(
            "failure_rate must be a number between 0.0 and 1.0, got {failure_rate}"
        )));
    }
    if !(0.0..=MAX_PROCESSING_DELAY_SECONDS).contains(&delay) {
        return Err(ApiError::BadRequest(format!(
            "delay must be a number of seconds between 0 and {MAX_PROCESSING_DELAY_SECONDS}, got {delay}"
        )));
    }
    let wait = wait_for(delay)?;

    if state.entropy.unit() < failure_rate {
        warn!(failure_rate, "simulated failure");
        return Err(ApiError::SimulatedFailure { failure_rate });
    }

    info!(failure_rate, delay, "sometimes-fail request succeeded");
    if !wait.is_zero() {
        pause(wait).await;
    }

    Ok(Json(FailReport {
        status: "success",
        result: "success",
        message: "Request succeeded",
        failure_rate,
        delay_seconds: delay,
    }))
}

// ── /burst-error ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BurstParams {
    error_duration: Option<u32>,
}

/// `GET /burst-error?error_duration=T`
///
/// Always `503`, advertising a `retry-after` of `T` seconds. Stateless: the
/// window is announced, not enforced on other routes.
pub async fn burst_error(req: Request, _state: AppState) -> ApiError {
    match burst_window(&req) {
        Ok(retry_after) => {
            warn!(retry_after, "burst error window announced");
            ApiError::Degraded { retry_after }
        }
        Err(e) => e,
    }
}

fn burst_window(req: &Request) -> Result<u32, ApiError> {
    let params: BurstParams = req.query()?;
    let seconds = params.error_duration.unwrap_or(DEFAULT_BURST_SECONDS);
    if !(1..=MAX_BURST_SECONDS).contains(&seconds) {
        return Err(ApiError::BadRequest(format!(
            "error_duration must be an integer between 1 and {MAX_BURST_SECONDS}, got {seconds}"
        )));
    }
    Ok(seconds)
}
