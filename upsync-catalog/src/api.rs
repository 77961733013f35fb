//! The two catalog primitives the observer is built on.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use upsync_core::Cursor;

use crate::CatalogError;

/// Registered service names mapped to the union of their tags.
pub type ServiceCatalog = BTreeMap<String, Vec<String>>;

/// One instance of a service with the checks that apply to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthEntry {
    /// The node hosting the instance
    pub node: NodeRecord,
    /// The registered service instance
    pub service: ServiceRecord,
    /// Node-level and service-level checks
    #[serde(default)]
    pub checks: Vec<CheckRecord>,
}

/// Node part of a health entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeRecord {
    /// Address servers are reached on
    pub address: String,
}

/// Service part of a health entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRecord {
    /// Unique instance ID
    #[serde(rename = "ID")]
    pub id: String,
    /// Service port
    pub port: u16,
    /// Instance tags, `null` when none were registered
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// A single health check result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckRecord {
    /// Instance the check is bound to, empty for node checks
    #[serde(rename = "ServiceID", default)]
    pub service_id: String,
    /// `passing`, `warning` or `critical`
    pub status: String,
}

/// Blocking catalog queries.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// List services, blocking up to `wait` for a change past `cursor`.
    ///
    /// Without a cursor the call returns immediately.
    async fn services(
        &self,
        cursor: Option<&Cursor>,
        wait: Duration,
    ) -> Result<(Cursor, ServiceCatalog), CatalogError>;

    /// All instances of one service with their checks.
    async fn health(&self, service: &str) -> Result<(Cursor, Vec<HealthEntry>), CatalogError>;
}
