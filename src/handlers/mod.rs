//! Route handlers and the error type they share.

pub mod delay;
pub mod failure;
pub mod info;

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::Serialize;
use tokio::time::Instant;

use crate::request::QueryError;
use crate::response::{IntoResponse, Response};
use crate::stats::round_millis;

/// Everything a handler can answer with other than success.
///
/// `BadRequest` is the caller's fault. The other two are the service doing
/// its job: failing on purpose.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Random failure occurred")]
    SimulatedFailure { failure_rate: f64 },

    #[error("Service is temporarily degraded")]
    Degraded { retry_after: u32 },
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        Self::BadRequest(format!("invalid query parameters: {e}"))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::SimulatedFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Degraded { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = ErrorBody {
            error: status.canonical_reason().unwrap_or("Error"),
            message: self.to_string(),
            failure_rate: None,
            retry_after: None,
            timestamp: None,
        };
        let builder = Response::builder().status(status);

        match self {
            Self::BadRequest(_) => builder.json(&body),
            Self::SimulatedFailure { failure_rate } => {
                body.failure_rate = Some(failure_rate);
                body.timestamp = Some(Utc::now());
                builder.json(&body)
            }
            Self::Degraded { retry_after } => {
                body.retry_after = Some(retry_after);
                builder.header("retry-after", &retry_after.to_string()).json(&body)
            }
        }
    }
}

/// Converts a validated number of seconds into a [`Duration`].
///
/// Range checks happen in each handler against the configured bounds; this
/// only refuses values a `Duration` cannot hold, so no input reaches a panic.
pub(crate) fn wait_for(seconds: f64) -> Result<Duration, ApiError> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| ApiError::BadRequest(format!("{seconds} is not a usable number of seconds")))
}

/// Suspends the current request without blocking the worker thread, and
/// returns the time actually spent in seconds, rounded to milliseconds.
pub(crate) async fn pause(wait: Duration) -> f64 {
    let started = Instant::now();
    tokio::time::sleep(wait).await;
    round_millis(started.elapsed().as_secs_f64())
}
