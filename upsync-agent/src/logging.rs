//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_directive`.
pub fn init(default_directive: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}
