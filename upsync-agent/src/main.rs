//! Upsync Agent
//!
//! Long-running daemon that keeps the proxy's dynamic upstream pools converged
//! on the healthy membership reported by the Consul catalog.

#![deny(missing_docs)]

mod config;
mod controller;
mod error;
mod logging;
mod persist;

use clap::Parser;
use tracing::{error, info};
use upsync_admin::DyupsClient;
use upsync_catalog::{CatalogObserver, ConsulClient};

use config::Args;
use controller::Controller;
use error::Result;
use persist::UpstreamWriter;

/// The primary entrypoint for the Upsync agent.
///
/// Everything runs on a single-threaded runtime: one loop, one request in
/// flight at a time.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log)?;

    info!(
        "starting upsync: catalog {}, proxy admin {}, upstream file {}",
        args.consul_addr,
        args.dyups_addr,
        args.upstream_file.display()
    );

    let http = reqwest::Client::builder().build()?;

    let catalog = ConsulClient::new(http.clone(), args.consul_addr.clone(), args.http_timeout());
    let observer = CatalogObserver::new(catalog, args.exclude.clone(), args.wait());
    let admin = DyupsClient::new(http, args.dyups_addr.clone(), args.http_timeout());
    let writer = UpstreamWriter::new(args.upstream_file.clone(), args.template());

    let controller = Controller::new(args.controller_config(), observer, admin, writer);
    let status = controller.status();

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received interrupt"),
            Err(e) => {
                // Without a signal handler only process termination stops us.
                error!("failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = controller.run() => {}
        _ = shutdown => {}
    }

    let last = status.snapshot();
    info!(
        "shutting down after {} iterations, {} pools applied, {} pending",
        last.iterations,
        last.pools,
        last.pending.len()
    );

    Ok(())
}
