//! Latency injection: fixed, random, pathological and staged delays.
//!
//! Every wait is a `tokio::time::sleep`, so a request parked here costs a
//! timer entry, not a thread. Parameters are validated before any sleep:
//! a rejected request answers immediately.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ApiError, pause, wait_for};
use crate::app::AppState;
use crate::config::MIN_SLOW_DELAY_SECONDS;
use crate::request::Request;
use crate::response::Json;
use crate::stats::round_millis;

/// Fixed duration of `/timeout-trap`. Deliberately not configurable.
pub const TIMEOUT_TRAP_SECONDS: u64 = 60;

/// Upper bound on `/cascade?levels=`.
pub const MAX_CASCADE_LEVELS: u32 = 5;
pub const DEFAULT_CASCADE_LEVELS: u32 = 3;
/// Delay added by each cascade stage, in seconds.
pub const CASCADE_STAGE_SECONDS: f64 = 1.0;
const CASCADE_STAGE: Duration = Duration::from_secs(1);

/// Bounds used by `/random` when the caller omits them. The upper default is
/// further capped by `MAX_DELAY`.
pub const DEFAULT_RANDOM_MIN_SECONDS: f64 = 1.0;
pub const DEFAULT_RANDOM_MAX_SECONDS: f64 = 10.0;

// ── /slow ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SlowParams {
    delay: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SlowReport {
    pub status: &'static str,
    pub delay_used: f64,
    pub actual_duration: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// `GET /slow?delay=D`
pub async fn slow(req: Request, state: AppState) -> Result<Json<SlowReport>, ApiError> {
    let params: SlowParams = req.query()?;
    let max = state.config.max_delay_seconds;
    let delay = params.delay.unwrap_or(state.config.default_delay_seconds);

    if !(MIN_SLOW_DELAY_SECONDS..=max).contains(&delay) {
        return Err(ApiError::BadRequest(format!(
            "delay must be a number of seconds between {MIN_SLOW_DELAY_SECONDS} and {max}, got {delay}"
        )));
    }

    let wait = wait_for(delay)?;
    info!(delay, "slow request");
    let actual_duration = pause(wait).await;

    Ok(Json(SlowReport {
        status: "success",
        delay_used: delay,
        actual_duration,
        message: format!("responded after {delay} seconds"),
        timestamp: Utc::now(),
    }))
}

// ── /random ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RandomParams {
    min_delay: Option<f64>,
    max_delay: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Serialize)]
pub struct RandomReport {
    pub status: &'static str,
    pub delay_used: f64,
    pub actual_duration: f64,
    pub range: DelayRange,
}

/// `GET /random?min_delay=A&max_delay=B`
pub async fn random(req: Request, state: AppState) -> Result<Json<RandomReport>, ApiError> {
    let params: RandomParams = req.query()?;
    let limit = state.config.max_delay_seconds;
    let low = params.min_delay.unwrap_or(DEFAULT_RANDOM_MIN_SECONDS);
    let high = params.max_delay.unwrap_or(DEFAULT_RANDOM_MAX_SECONDS.min(limit));

    // Written so that NaN fails every comparison and lands in the error arm.
    if !(low > 0.0 && low <= high && high <= limit) {
        return Err(ApiError::BadRequest(format!(
            "require 0 < min_delay <= max_delay <= {limit}, got min_delay={low} max_delay={high}"
        )));
    }

    let delay = round_millis(state.entropy.between(low, high)).clamp(low, high);
    let wait = wait_for(delay)?;
    info!(delay, low, high, "random delay request");
    let actual_duration = pause(wait).await;

    Ok(Json(RandomReport {
        status: "success",
        delay_used: delay,
        actual_duration,
        range: DelayRange { min: low, max: high },
    }))
}

// ── /timeout-trap ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TrapReport {
    pub status: &'static str,
    pub delay_used: u64,
    pub actual_duration: f64,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// `GET /timeout-trap`
pub async fn timeout_trap(_req: Request, _state: AppState) -> Json<TrapReport> {
    warn!(seconds = TIMEOUT_TRAP_SECONDS, "timeout trap triggered");
    let actual_duration = pause(Duration::from_secs(TIMEOUT_TRAP_SECONDS)).await;

    Json(TrapReport {
        status: "completed",
        delay_used: TIMEOUT_TRAP_SECONDS,
        actual_duration,
        message: "responded after 60 seconds",
        timestamp: Utc::now(),
    })
}

// ── /cascade ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CascadeParams {
    levels: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Stage {
    pub level: u32,
    pub delay: f64,
}

#[derive(Debug, Serialize)]
pub struct CascadeReport {
    pub status: &'static str,
    pub levels: u32,
    pub total_delay: f64,
    pub actual_duration: f64,
    pub stages: Vec<Stage>,
}

/// `GET /cascade?levels=N`
///
/// Simulates a chain of `N` dependent calls inside one request. Stages run
/// strictly one after another; nothing leaves the process.
pub async fn cascade(req: Request, _state: AppState) -> Result<Json<CascadeReport>, ApiError> {
    let params: CascadeParams = req.query()?;
    let levels = params.levels.unwrap_or(DEFAULT_CASCADE_LEVELS);

    if !(1..=MAX_CASCADE_LEVELS).contains(&levels) {
        return Err(ApiError::BadRequest(format!(
            "levels must be an integer between 1 and {MAX_CASCADE_LEVELS}, got {levels}"
        )));
    }

    let mut stages = Vec::with_capacity(levels as usize);
    let mut actual_duration = 0.0;
    for level in 1..=levels {
        actual_duration += pause(CASCADE_STAGE).await;
        debug!(level, levels, "cascade stage complete");
        stages.push(Stage { level, delay: CASCADE_STAGE_SECONDS });
    }

    Ok(Json(CascadeReport {
        status: "success",
        levels,
        total_delay: f64::from(levels) * CASCADE_STAGE_SECONDS,
        actual_duration: round_millis(actual_duration),
        stages,
    }))
}
