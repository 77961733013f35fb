//! Membership snapshots.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::instance::Member;

/// Opaque watermark returned by the catalog for resuming a long poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a raw catalog index.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw index value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of passing members of a pool. Ordering is irrelevant for equality.
pub type Members = BTreeSet<Member>;

/// Pool name to member set, as observed at one cursor.
///
/// A pool may be present with no members when every one of its instances is
/// failing. Presence, not membership, decides whether a pool exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pools: BTreeMap<String, Members>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a pool exists, possibly with no members.
    pub fn ensure_pool(&mut self, name: &str) -> &mut Members {
        self.pools.entry(name.to_string()).or_default()
    }

    /// Add a member to a pool, creating the pool if needed.
    pub fn add_member(&mut self, pool: &str, member: Member) {
        self.ensure_pool(pool).insert(member);
    }

    /// Members of a pool, if the pool exists.
    pub fn members(&self, pool: &str) -> Option<&Members> {
        self.pools.get(pool)
    }

    /// Whether the pool exists in this snapshot.
    pub fn contains(&self, pool: &str) -> bool {
        self.pools.contains_key(pool)
    }

    /// Number of pools.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether no pool was observed at all.
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Pool names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    /// Pools with their members in sorted order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Members> {
        self.pools.iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a Members);
    type IntoIter = btree_map::Iter<'a, String, Members>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<(String, Members)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (String, Members)>>(iter: T) -> Self {
        Self {
            pools: iter.into_iter().collect(),
        }
    }
}
