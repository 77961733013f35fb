//! Upsync Catalog Observer
//!
//! Long-polls the Consul catalog and normalizes its healthy instances into
//! membership snapshots.

pub mod api;
pub mod consul;
mod error;
pub mod observer;

pub use api::{CatalogApi, CheckRecord, HealthEntry, NodeRecord, ServiceCatalog, ServiceRecord};
pub use consul::ConsulClient;
pub use error::CatalogError;
pub use observer::{normalize, CatalogObserver, DEFAULT_WAIT};
