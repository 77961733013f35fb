//! HTTP client for the Consul agent API.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use tracing::debug;
use upsync_core::Cursor;

use crate::api::{CatalogApi, HealthEntry, ServiceCatalog};
use crate::CatalogError;

/// Header carrying the catalog's raft index.
pub const INDEX_HEADER: &str = "X-Consul-Index";

/// Catalog backed by a Consul agent.
#[derive(Debug, Clone)]
pub struct ConsulClient {
    http: Client,
    base: Url,
    timeout: Duration,
}

impl ConsulClient {
    /// Create a client for the agent at `base`.
    ///
    /// `timeout` bounds plain requests. Long polls are additionally allowed the
    /// wait itself plus the agent's jitter, see [`ConsulClient::poll_timeout`].
    pub fn new(http: Client, base: Url, timeout: Duration) -> Self {
        Self {
            http,
            base,
            timeout,
        }
    }

    /// Deadline for a blocking query waiting up to `wait`.
    ///
    /// The agent adds up to `wait / 16` of random jitter before answering an
    /// idle query.
    pub fn poll_timeout(&self, wait: Duration) -> Duration {
        wait + wait / 16 + self.timeout
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<(Cursor, Response), CatalogError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Protocol(format!(
                "unexpected status {status} from {}",
                response.url()
            )));
        }

        let index = response
            .headers()
            .get(INDEX_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.parse::<u64>().is_ok())
            .ok_or_else(|| CatalogError::Protocol(format!("missing or invalid {INDEX_HEADER}")))?;

        Ok((Cursor::new(index), response))
    }
}

#[async_trait]
impl CatalogApi for ConsulClient {
    async fn services(
        &self,
        cursor: Option<&Cursor>,
        wait: Duration,
    ) -> Result<(Cursor, ServiceCatalog), CatalogError> {
        let mut request = self.http.get(self.endpoint(&["v1", "catalog", "services"]));

        request = match cursor {
            Some(cursor) => {
                let wait_param = format!("{}s", wait.as_secs());
                debug!("long polling catalog from index {} for {}", cursor, wait_param);
                request
                    .query(&[("index", cursor.as_str()), ("wait", wait_param.as_str())])
                    .timeout(self.poll_timeout(wait))
            }
            None => request.timeout(self.timeout),
        };

        let (cursor, response) = self.send(request).await?;
        let services: BTreeMap<String, Option<Vec<String>>> = response.json().await?;

        let services = services
            .into_iter()
            .map(|(name, tags)| (name, tags.unwrap_or_default()))
            .collect();

        Ok((cursor, services))
    }

    async fn health(&self, service: &str) -> Result<(Cursor, Vec<HealthEntry>), CatalogError> {
        let request = self
            .http
            .get(self.endpoint(&["v1", "health", "service", service]))
            .timeout(self.timeout);

        let (cursor, response) = self.send(request).await?;
        let entries = response.json().await?;

        Ok((cursor, entries))
    }
}
