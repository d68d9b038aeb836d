//! Application wiring: shared state and the route table.

use std::sync::Arc;

use crate::config::Config;
use crate::entropy::Entropy;
use crate::handlers::{delay, failure, info};
use crate::router::Router;
use crate::stats::Stats;

pub const SERVICE_NAME: &str = "laggard";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Every route the service answers, with the description `/` advertises.
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("/", "Service information"),
    ("/health", "Health check"),
    ("/stats", "Request counters and uptime"),
    ("/slow", "Responds after `delay` seconds"),
    ("/random", "Responds after a random delay between `min_delay` and `max_delay`"),
    ("/sometimes-fail", "Fails with 500 at probability `failure_rate`"),
    ("/timeout-trap", "Responds after 60 seconds"),
    ("/cascade", "Runs `levels` serial one-second stages"),
    ("/burst-error", "Always 503 with a retry-after of `error_duration` seconds"),
];

/// State handed to every handler. Cloning is cheap: three reference counts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stats: Arc<Stats>,
    pub entropy: Arc<dyn Entropy>,
}

impl AppState {
    pub fn new(config: Config, entropy: impl Entropy) -> Self {
        Self {
            config: Arc::new(config),
            stats: Arc::new(Stats::new()),
            entropy: Arc::new(entropy),
        }
    }
}

/// Builds the router. Every matched request is counted in
/// [`AppState::stats`] before its handler runs.
pub fn router(state: AppState) -> Router<AppState> {
    let stats = Arc::clone(&state.stats);
    Router::with_state(state)
        .get("/", info::index)
        .get("/health", info::health)
        .get("/stats", info::stats)
        .get("/slow", delay::slow)
        .get("/random", delay::random)
        .get("/timeout-trap", delay::timeout_trap)
        .get("/cascade", delay::cascade)
        .get("/sometimes-fail", failure::sometimes_fail)
        .get("/burst-error", failure::burst_error)
        .on_match(move |route| stats.record(route))
}
