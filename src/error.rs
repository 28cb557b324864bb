//! Application-wide error types.

use thiserror::Error;

/// Fatal process-level failures: startup and server lifecycle only.
/// Request-scoped failures use the service and store error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
