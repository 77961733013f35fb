//! Dynamic upstream admin client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use upsync_core::Members;

use crate::AdminError;

/// Idempotent pool-level operations on the proxy.
#[async_trait]
pub trait ProxyAdmin: Send + Sync {
    /// Create the pool or replace all of its servers.
    async fn add_or_replace(&self, pool: &str, members: &Members) -> Result<StatusCode, AdminError>;

    /// Drop the pool.
    async fn delete(&self, pool: &str) -> Result<StatusCode, AdminError>;
}

/// Build the plain-text body the admin API expects: `server <addr>;` per member.
pub fn server_list(members: &Members) -> String {
    members
        .iter()
        .map(|member| format!("server {member};"))
        .collect()
}

/// Client for an nginx dyups style admin endpoint (`<base>/upstream/<name>`).
#[derive(Debug, Clone)]
pub struct DyupsClient {
    http: Client,
    base: Url,
    timeout: Duration,
}

impl DyupsClient {
    /// Create a client for the admin API at `base`.
    pub fn new(http: Client, base: Url, timeout: Duration) -> Self {
        Self {
            http,
            base,
            timeout,
        }
    }

    fn upstream_url(&self, pool: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["upstream", pool]);
        }
        url
    }
}

#[async_trait]
impl ProxyAdmin for DyupsClient {
    async fn add_or_replace(&self, pool: &str, members: &Members) -> Result<StatusCode, AdminError> {
        let body = server_list(members);
        debug!("posting upstream {}: {}", pool, body);

        let response = self
            .http
            .post(self.upstream_url(pool))
            .timeout(self.timeout)
            .body(body)
            .send()
            .await?;

        Ok(response.status())
    }

    async fn delete(&self, pool: &str) -> Result<StatusCode, AdminError> {
        debug!("deleting upstream {}", pool);

        let response = self
            .http
            .delete(self.upstream_url(pool))
            .timeout(self.timeout)
            .send()
            .await?;

        Ok(response.status())
    }
}
