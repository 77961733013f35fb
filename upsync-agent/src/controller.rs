//! Convergence controller.
//!
//! Owns the last applied snapshot and catalog cursor and drives one
//! observe → diff → persist → apply → commit cycle per iteration. No failure
//! in here stops the loop: catalog errors skip the iteration, proxy and disk
//! errors are logged and the new snapshot is committed anyway.
//!
//! Pools whose push to the proxy failed are remembered as pending. When retry
//! is enabled they are pushed again, from the then current snapshot, on the
//! next iteration that observes a new cursor.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use upsync_admin::{ApplyOutcome, ProxyAdmin};
use upsync_catalog::{CatalogApi, CatalogError, CatalogObserver};
use upsync_core::{
    diff, Changeset, Cursor, Members, Phase, SharedStatusBoard, Snapshot, Status, StatusBoard,
};

use crate::persist::UpstreamWriter;

/// Loop policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Delay before every poll, bounds the load put on the catalog
    pub poll_interval: Duration,
    /// Non-empty snapshots with fewer pools are treated as a catalog fault
    pub min_pools: usize,
    /// Re-push pools whose last apply failed
    pub retry_failed: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            min_pools: 30,
            retry_failed: true,
        }
    }
}

/// What was pushed for a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolAction {
    /// Full member list posted
    AddOrReplace,
    /// Pool deleted
    Delete,
}

/// Outcome of one pool push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolResult {
    /// Pool name
    pub pool: String,
    /// Operation sent to the proxy
    pub action: PoolAction,
    /// How the proxy answered
    pub outcome: ApplyOutcome,
}

/// Everything done in an iteration that committed a new snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Diff against the previously applied snapshot
    pub changeset: Changeset,
    /// Pending pools pushed again outside the changeset
    pub retried: BTreeSet<String>,
    /// Whether the upstream file was rewritten
    pub persisted: bool,
    /// Per-pool proxy results, in push order
    pub results: Vec<PoolResult>,
}

impl ApplyReport {
    /// Pools whose push did not succeed.
    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|result| result.outcome.is_retryable())
            .map(|result| result.pool.as_str())
    }
}

/// How an iteration ended.
#[derive(Debug)]
pub enum Iteration {
    /// Observation failed; nothing changed
    CatalogFailed(CatalogError),
    /// The snapshot had too few pools and was discarded
    SafetyGate {
        /// Pool count of the discarded snapshot
        pools: usize,
    },
    /// The cursor did not move
    Unchanged,
    /// A new snapshot was committed
    Applied(ApplyReport),
}

impl Iteration {
    /// The status board phase for this iteration.
    pub fn phase(&self) -> Phase {
        match self {
            Iteration::CatalogFailed(_) => Phase::CatalogFailed,
            Iteration::SafetyGate { .. } => Phase::SafetyGate,
            Iteration::Unchanged => Phase::Unchanged,
            Iteration::Applied(_) => Phase::Applied,
        }
    }
}

impl fmt::Display for Iteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Iteration::CatalogFailed(err) => write!(f, "catalog failed: {err}"),
            Iteration::SafetyGate { pools } => write!(f, "safety gate tripped at {pools} pools"),
            Iteration::Unchanged => f.write_str("unchanged"),
            Iteration::Applied(report) => write!(
                f,
                "applied {} pool changes and {} retries, persisted: {}",
                report.changeset.touched_len(),
                report.retried.len(),
                report.persisted
            ),
        }
    }
}

/// The reconcile loop.
pub struct Controller<C, A> {
    config: ControllerConfig,
    observer: CatalogObserver<C>,
    admin: A,
    writer: UpstreamWriter,
    previous: Snapshot,
    cursor: Option<Cursor>,
    pending: BTreeSet<String>,
    iterations: u64,
    status: SharedStatusBoard,
}

impl<C, A> Controller<C, A>
where
    C: CatalogApi,
    A: ProxyAdmin,
{
    /// Create a controller with no applied snapshot and no cursor.
    pub fn new(
        config: ControllerConfig,
        observer: CatalogObserver<C>,
        admin: A,
        writer: UpstreamWriter,
    ) -> Self {
        info!(
            "creating controller polling every {:?}, minimum {} pools, retry failed pools: {}",
            config.poll_interval, config.min_pools, config.retry_failed
        );

        Self {
            config,
            observer,
            admin,
            writer,
            previous: Snapshot::new(),
            cursor: None,
            pending: BTreeSet::new(),
            iterations: 0,
            status: Arc::new(StatusBoard::new()),
        }
    }

    /// Handle to the board the controller publishes to after every iteration.
    pub fn status(&self) -> SharedStatusBoard {
        self.status.clone()
    }

    /// Run until the task is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::time::sleep(self.config.poll_interval).await;

            let iteration = self.step().await;
            debug!("iteration {} {}", self.iterations, iteration);
        }
    }

    /// Run a single iteration without the leading delay.
    pub async fn step(&mut self) -> Iteration {
        let iteration = self.reconcile().await;
        self.iterations += 1;

        self.status.publish(Status {
            iterations: self.iterations,
            phase: iteration.phase(),
            cursor: self.cursor.clone(),
            pools: self.previous.len(),
            pending: self.pending.iter().cloned().collect(),
        });

        iteration
    }

    async fn reconcile(&mut self) -> Iteration {
        let (cursor, current) = match self.observer.observe(self.cursor.as_ref()).await {
            Ok(observed) => observed,
            Err(err) => {
                error!("failed to observe catalog: {}", err);
                return Iteration::CatalogFailed(err);
            }
        };

        if !current.is_empty() && current.len() < self.config.min_pools {
            error!(
                "catalog reported {} pools, fewer than the minimum of {}; keeping the applied upstreams",
                current.len(),
                self.config.min_pools
            );
            return Iteration::SafetyGate {
                pools: current.len(),
            };
        }

        info!("there are {} pools in the catalog", current.len());

        if self.cursor.as_ref() == Some(&cursor) {
            info!("catalog index {} unchanged, nothing to do", cursor);
            return Iteration::Unchanged;
        }

        info!(
            "catalog index moved from {} to {}",
            self.cursor.as_ref().map_or("none", Cursor::as_str),
            cursor
        );

        let changeset = diff(&current, &self.previous);
        let retried = if self.config.retry_failed {
            self.pending
                .iter()
                .filter(|pool| !changeset.touches(pool))
                .cloned()
                .collect()
        } else {
            BTreeSet::new()
        };

        let report = self.apply(&current, changeset, retried).await;

        self.pending = report.failed().map(str::to_string).collect();
        self.previous = current;
        self.cursor = Some(cursor);

        Iteration::Applied(report)
    }

    async fn apply(
        &self,
        current: &Snapshot,
        changeset: Changeset,
        retried: BTreeSet<String>,
    ) -> ApplyReport {
        let mut report = ApplyReport {
            changeset,
            retried,
            ..Default::default()
        };

        if report.changeset.is_empty() && report.retried.is_empty() {
            info!("no upstream changes");
            return report;
        }

        // The file must never fall behind the proxy.
        report.persisted = match self.writer.persist(current).await {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "failed to persist upstreams into {}: {}",
                    self.writer.path().display(),
                    err
                );
                false
            }
        };

        for pool in &report.changeset.removed {
            info!("removing upstream {}, it is no longer in the catalog", pool);
            report.results.push(self.delete(pool).await);
        }

        for pool in &report.changeset.added {
            info!("adding upstream {}", pool);
            report.results.push(self.replace(pool, current).await);
        }

        for pool in &report.changeset.changed {
            info!("upstream {} servers have changed", pool);
            report.results.push(self.replace(pool, current).await);
        }

        for pool in &report.retried {
            info!("retrying upstream {} after an earlier failure", pool);
            let result = if current.contains(pool) {
                self.replace(pool, current).await
            } else {
                self.delete(pool).await
            };
            report.results.push(result);
        }

        for result in report.results.iter().filter(|r| r.outcome.is_retryable()) {
            warn!(
                "upstream {} left pending after {:?}: {}",
                result.pool, result.action, result.outcome
            );
        }
        info!("pushed {} upstreams", report.results.len());

        report
    }

    async fn replace(&self, pool: &str, current: &Snapshot) -> PoolResult {
        let empty = Members::new();
        let members = current.members(pool).unwrap_or(&empty);

        let outcome = ApplyOutcome::from(self.admin.add_or_replace(pool, members).await);
        match &outcome {
            ApplyOutcome::Applied => info!("replaced upstream {} with {} servers", pool, members.len()),
            ApplyOutcome::Rejected(status) => {
                warn!("failed to replace upstream {}: proxy answered {}", pool, status)
            }
            ApplyOutcome::Unreachable(reason) => {
                error!("can't reach proxy admin API replacing upstream {}: {}", pool, reason)
            }
        }

        PoolResult {
            pool: pool.to_string(),
            action: PoolAction::AddOrReplace,
            outcome,
        }
    }

    async fn delete(&self, pool: &str) -> PoolResult {
        let outcome = ApplyOutcome::from(self.admin.delete(pool).await);
        match &outcome {
            ApplyOutcome::Applied => info!("removed upstream {}", pool),
            ApplyOutcome::Rejected(status) => {
                warn!("failed to remove upstream {}: proxy answered {}", pool, status)
            }
            ApplyOutcome::Unreachable(reason) => {
                error!("can't reach proxy admin API removing upstream {}: {}", pool, reason)
            }
        }

        PoolResult {
            pool: pool.to_string(),
            action: PoolAction::Delete,
            outcome,
        }
    }
}
