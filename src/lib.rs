//! # laggard
//!
//! A fault-injection HTTP stub. Point the system under test at it and watch
//! how its timeouts, retries and circuit breakers cope.
//!
//! | Route | Misbehaviour |
//! |---|---|
//! | `/slow?delay=D` | answers after `D` seconds |
//! | `/random?min_delay=A&max_delay=B` | answers after a uniform delay in `[A, B]` |
//! | `/sometimes-fail?failure_rate=R` | `500` with probability `R` |
//! | `/timeout-trap` | answers after 60 seconds |
//! | `/cascade?levels=N` | `N` serial one-second stages |
//! | `/burst-error?error_duration=T` | always `503`, `retry-after: T` |
//!
//! Plus `/`, `/health` and `/stats`, which behave.
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use laggard::{AppState, Config, Server, ThreadEntropy, app};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), laggard::Error> {
//!     let config = Config::from_env()?;
//!     let addr = config.bind_addr();
//!     let router = app::router(AppState::new(config, ThreadEntropy));
//!     Server::bind(addr).serve(router).await
//! }
//! ```
//!
//! ## Testing without a socket
//!
//! [`Router::oneshot`] runs the full routing path in process. Combined with
//! a paused tokio clock and [`ScriptedEntropy`], every endpoint is
//! deterministic and instant.

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod app;
pub mod config;
pub mod entropy;
pub mod handlers;
pub mod middleware;
pub mod stats;

pub use app::AppState;
pub use config::{Config, ConfigError};
pub use entropy::{Entropy, ScriptedEntropy, ThreadEntropy};
pub use error::Error;
pub use handler::Handler;
pub use handlers::ApiError;
pub use request::{QueryError, Request};
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use stats::{Stats, StatsSnapshot};
