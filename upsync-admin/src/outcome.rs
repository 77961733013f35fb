//! Per-pool apply results.

use std::fmt;

use reqwest::StatusCode;

use crate::AdminError;

/// The result of pushing one pool change to the proxy.
///
/// Nothing here is fatal. Anything but [`ApplyOutcome::Applied`] is worth
/// retrying once the pool is reconciled again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The proxy answered 200
    Applied,
    /// The proxy answered with another status
    Rejected(StatusCode),
    /// The proxy could not be reached
    Unreachable(String),
}

impl ApplyOutcome {
    /// Whether the proxy accepted the change.
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }

    /// Whether the change should be attempted again later.
    pub fn is_retryable(&self) -> bool {
        !self.is_applied()
    }
}

impl From<Result<StatusCode, AdminError>> for ApplyOutcome {
    fn from(result: Result<StatusCode, AdminError>) -> Self {
        match result {
            Ok(StatusCode::OK) => ApplyOutcome::Applied,
            Ok(status) => ApplyOutcome::Rejected(status),
            Err(err) => ApplyOutcome::Unreachable(err.to_string()),
        }
    }
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyOutcome::Applied => f.write_str("applied"),
            ApplyOutcome::Rejected(status) => write!(f, "rejected with {status}"),
            ApplyOutcome::Unreachable(reason) => write!(f, "unreachable: {reason}"),
        }
    }
}
