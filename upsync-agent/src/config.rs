//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use reqwest::Url;
use upsync_core::UpstreamTemplate;

use crate::controller::ControllerConfig;

/// Keep proxy upstreams in sync with the Consul catalog.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Consul agent HTTP address.
    #[arg(long, env = "UPSYNC_CONSUL_ADDR", default_value = "http://127.0.0.1:8500")]
    pub consul_addr: Url,

    /// Services that are never synced into the proxy.
    #[arg(long, env = "UPSYNC_EXCLUDE", value_delimiter = ',', default_value = "consul")]
    pub exclude: Vec<String>,

    /// Maximum time a catalog long poll blocks, in seconds.
    ///
    /// Zero is rejected: the agent reads `wait=0s` as its own five minute default.
    #[arg(
        long,
        env = "UPSYNC_WAIT_SECS",
        default_value_t = 180,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub wait_secs: u64,

    /// Base URL of the proxy's dynamic upstream admin API.
    #[arg(long, env = "UPSYNC_DYUPS_ADDR", default_value = "http://127.0.0.1:18882")]
    pub dyups_addr: Url,

    /// Upstream config file the proxy loads on start and reload.
    #[arg(
        long,
        env = "UPSYNC_UPSTREAM_FILE",
        default_value = "/home/dyups/apps/config/nginx/conf.d/dyups.upstream.com.conf"
    )]
    pub upstream_file: PathBuf,

    /// `keepalive` connections per persisted upstream.
    #[arg(long, env = "UPSYNC_KEEPALIVE", default_value_t = 20)]
    pub keepalive: u32,

    /// `max_fails` for every persisted server.
    #[arg(long, env = "UPSYNC_MAX_FAILS", default_value_t = 3)]
    pub max_fails: u32,

    /// `fail_timeout` for every persisted server.
    #[arg(long, env = "UPSYNC_FAIL_TIMEOUT", default_value = "2s")]
    pub fail_timeout: String,

    /// Delay before every catalog poll, in seconds.
    #[arg(long, env = "UPSYNC_POLL_INTERVAL_SECS", default_value_t = 2)]
    pub poll_interval_secs: u64,

    /// Non-empty catalog views with fewer pools than this are ignored.
    #[arg(long, env = "UPSYNC_MIN_POOLS", default_value_t = 30)]
    pub min_pools: usize,

    /// Timeout for proxy admin and health calls, in seconds.
    #[arg(long, env = "UPSYNC_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Re-apply pools whose last push to the proxy failed.
    #[arg(long, env = "UPSYNC_RETRY_FAILED", default_value_t = true, action = ArgAction::Set)]
    pub retry_failed: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, env = "UPSYNC_LOG", default_value = "info")]
    pub log: String,
}

impl Args {
    /// Long-poll wait handed to the catalog.
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    /// Timeout for plain HTTP calls.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Directives for the persisted upstream file.
    pub fn template(&self) -> UpstreamTemplate {
        UpstreamTemplate {
            max_fails: self.max_fails,
            fail_timeout: self.fail_timeout.clone(),
            keepalive: self.keepalive,
        }
    }

    /// Loop policy for the controller.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            min_pools: self.min_pools,
            retry_failed: self.retry_failed,
        }
    }
}
