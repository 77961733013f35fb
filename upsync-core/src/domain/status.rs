//! Status board publishing the reconciler's latest state.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::domain::snapshot::Cursor;

/// How the most recent reconcile iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No iteration has completed yet
    #[default]
    Init,
    /// The catalog could not be observed
    CatalogFailed,
    /// The observed snapshot was rejected by the minimum pool count
    SafetyGate,
    /// The catalog cursor did not move
    Unchanged,
    /// A new snapshot was committed
    Applied,
}

/// A point-in-time view of the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    /// Number of finished iterations
    pub iterations: u64,
    /// Outcome of the last iteration
    pub phase: Phase,
    /// Cursor of the last committed snapshot
    pub cursor: Option<Cursor>,
    /// Pool count of the last committed snapshot
    pub pools: usize,
    /// Pools whose last apply against the proxy did not succeed
    pub pending: Vec<String>,
}

/// Lock-free holder of the latest [`Status`].
///
/// The reconcile loop is the only writer; readers never block it.
#[derive(Debug, Default)]
pub struct StatusBoard {
    current: ArcSwap<Status>,
}

impl StatusBoard {
    /// Create a board in the [`Phase::Init`] state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the published status.
    pub fn publish(&self, status: Status) {
        self.current.store(Arc::new(status));
    }

    /// Retrieve the latest published status.
    pub fn snapshot(&self) -> Arc<Status> {
        self.current.load_full()
    }
}

/// A shared reference to the status board.
pub type SharedStatusBoard = Arc<StatusBoard>;
