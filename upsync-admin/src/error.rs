//! Error type of the proxy admin client.

use thiserror::Error;

/// Errors talking to the proxy admin API.
///
/// A reply with a non-200 status is not an error; it is handed back to the
/// caller as the status code.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Connection refused, reset or timed out.
    #[error("proxy admin API unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
}
