//! Unified error type.

use crate::config::ConfigError;

/// The error type returned by laggard's fallible operations.
///
/// Application-level errors (400, 404, simulated 500s, etc.) are expressed
/// as HTTP [`Response`](crate::Response) values, not as `Error`s. This type
/// surfaces start-up and infrastructure failures: a bad environment, or
/// binding to a port.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}
