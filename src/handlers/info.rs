//! Endpoints that describe the service rather than misbehave.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::{AppState, ENDPOINTS, SERVICE_NAME, VERSION};
use crate::config::Config;
use crate::request::Request;
use crate::response::Json;
use crate::stats::StatsSnapshot;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub purpose: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    /// Serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub service: &'static str,
    #[serde(flatten)]
    pub counters: StatsSnapshot,
    pub config: Config,
}

/// `GET /`
pub async fn index(_req: Request, _state: AppState) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: VERSION,
        status: "operational",
        purpose: "Simulates slow and unreliable downstream dependencies",
        endpoints: ENDPOINTS.iter()
            .map(|&(path, description)| EndpointInfo { path, description })
            .collect(),
    })
}

/// `GET /health`
pub async fn health(_req: Request, _state: AppState) -> Json<Health> {
    Json(Health { status: "healthy", timestamp: Utc::now() })
}

/// `GET /stats`
pub async fn stats(_req: Request, state: AppState) -> Json<StatsReport> {
    Json(StatsReport {
        service: SERVICE_NAME,
        counters: state.stats.snapshot(),
        config: (*state.config).clone(),
    })
}
