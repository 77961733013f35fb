//! Error type of the catalog observer.

use thiserror::Error;

/// Errors raised while observing the catalog. Both kinds are retried on the
/// next iteration.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog agent could not be reached or the call timed out.
    #[error("catalog unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),

    /// The catalog answered with something we cannot interpret.
    #[error("catalog protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CatalogError::Protocol(err.to_string())
        } else {
            CatalogError::Unavailable(err)
        }
    }
}
