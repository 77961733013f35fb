//! Error types for agent startup and upstream file persistence.

use thiserror::Error;

/// Errors that abort agent startup.
#[derive(Debug, Error)]
pub enum Error {
    /// The shared HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The tracing subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

/// Result alias for agent startup.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while writing the upstream file.
///
/// Never fatal: the controller logs them and still pushes to the proxy.
#[derive(Debug, Error)]
pub enum PersistError {
    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),
}
