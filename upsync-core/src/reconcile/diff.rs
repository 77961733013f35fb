//! Snapshot differ.
//!
//! Classifies every pool name seen in either of two snapshots into exactly one
//! of four buckets. Pool existence decides added/removed; member-set equality
//! decides changed/unchanged for pools present on both sides.

use std::collections::BTreeSet;

use crate::domain::snapshot::Snapshot;

/// Pool names partitioned by how they moved between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    /// Present only in the current snapshot
    pub added: BTreeSet<String>,
    /// Present only in the previous snapshot
    pub removed: BTreeSet<String>,
    /// Present in both with different member sets
    pub changed: BTreeSet<String>,
    /// Present in both with identical member sets
    pub unchanged: BTreeSet<String>,
}

impl Changeset {
    /// Whether nothing needs to be pushed to the proxy.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Whether a pool is added, removed or changed.
    pub fn touches(&self, pool: &str) -> bool {
        self.added.contains(pool) || self.removed.contains(pool) || self.changed.contains(pool)
    }

    /// Number of pools that need to be pushed.
    pub fn touched_len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

/// Compute the changeset that turns `previous` into `current`.
pub fn diff(current: &Snapshot, previous: &Snapshot) -> Changeset {
    let mut changeset = Changeset::default();

    for (name, members) in current {
        match previous.members(name) {
            None => {
                changeset.added.insert(name.clone());
            }
            Some(old) if old != members => {
                changeset.changed.insert(name.clone());
            }
            Some(_) => {
                changeset.unchanged.insert(name.clone());
            }
        }
    }

    changeset.removed = previous
        .names()
        .filter(|name| !current.contains(name))
        .map(str::to_string)
        .collect();

    changeset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instance::Member;
    use crate::domain::snapshot::Members;
    use proptest::prelude::*;

    fn snapshot(pools: &[(&str, &[&str])]) -> Snapshot {
        pools
            .iter()
            .map(|(name, hosts)| {
                let members = hosts.iter().map(|host| Member::new(*host, 80)).collect();
                (name.to_string(), members)
            })
            .collect()
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classifies_added_removed_changed() {
        let previous = snapshot(&[("A", &["1.1.1.1"]), ("B", &["2.2.2.2"])]);
        let current = snapshot(&[("A", &["1.1.1.1", "1.1.1.2"]), ("C", &["3.3.3.3"])]);

        let changes = diff(&current, &previous);

        assert_eq!(changes.added, names(&["C"]));
        assert_eq!(changes.removed, names(&["B"]));
        assert_eq!(changes.changed, names(&["A"]));
        assert!(changes.unchanged.is_empty());
        assert!(!changes.is_empty());
        assert_eq!(changes.touched_len(), 3);
    }

    #[test]
    fn identical_snapshots_are_unchanged() {
        let a = snapshot(&[("A", &["1.1.1.1"]), ("B", &[])]);
        let changes = diff(&a, &a);

        assert!(changes.is_empty());
        assert_eq!(changes.unchanged, names(&["A", "B"]));
    }

    #[test]
    fn emptied_pool_is_changed_not_removed() {
        let previous = snapshot(&[("A", &["1.1.1.1"])]);
        let current = snapshot(&[("A", &[])]);

        let changes = diff(&current, &previous);

        assert_eq!(changes.changed, names(&["A"]));
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn first_observation_adds_everything() {
        let current = snapshot(&[("A", &["1.1.1.1"]), ("B", &[])]);
        let changes = diff(&current, &Snapshot::new());

        assert_eq!(changes.added, names(&["A", "B"]));
    }

    fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
        let member = (0u8..4).prop_map(|n| Member::new(format!("10.0.0.{n}"), 80));
        prop::collection::btree_map("[a-e]", prop::collection::btree_set(member, 0..3), 0..5)
            .prop_map(|pools| pools.into_iter().collect::<Snapshot>())
    }

    proptest! {
        #[test]
        fn buckets_partition_all_names(current in arb_snapshot(), previous in arb_snapshot()) {
            let changes = diff(&current, &previous);

            let all: BTreeSet<String> = current.names().chain(previous.names()).map(str::to_string).collect();
            let buckets = [&changes.added, &changes.removed, &changes.changed, &changes.unchanged];

            let total: usize = buckets.iter().map(|b| b.len()).sum();
            let union: BTreeSet<String> = buckets.iter().flat_map(|b| b.iter().cloned()).collect();

            prop_assert_eq!(total, all.len());
            prop_assert_eq!(union, all);
        }

        #[test]
        fn self_diff_is_all_unchanged(a in arb_snapshot()) {
            let changes = diff(&a, &a);
            let keys: BTreeSet<String> = a.names().map(str::to_string).collect();

            prop_assert!(changes.is_empty());
            prop_assert_eq!(changes.unchanged, keys);
        }

        #[test]
        fn changed_pools_differ_in_members(current in arb_snapshot(), previous in arb_snapshot()) {
            let changes = diff(&current, &previous);
            for name in &changes.changed {
                let now: Option<&Members> = current.members(name);
                prop_assert_ne!(now, previous.members(name));
            }
        }
    }
}
