//! Upsync Proxy Admin Client
//!
//! Pushes whole upstream pools to the proxy's dynamic upstream API and
//! classifies the replies.

pub mod client;
mod error;
pub mod outcome;

pub use client::{server_list, DyupsClient, ProxyAdmin};
pub use error::AdminError;
pub use outcome::ApplyOutcome;
pub use reqwest::StatusCode;
