use std::process::ExitCode;

use laggard::{AppState, Config, Server, ThreadEntropy, app};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = app::VERSION,
        addr = %config.bind_addr(),
        default_delay = config.default_delay_seconds,
        max_delay = config.max_delay_seconds,
        failure_rate = config.default_failure_rate,
        "configuration loaded"
    );

    let addr = config.bind_addr();
    let router = app::router(AppState::new(config, ThreadEntropy));

    match Server::bind(addr).serve(router).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server error: {e}");
            ExitCode::FAILURE
        }
    }
}
