//! Normalizes raw catalog records into membership snapshots.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use upsync_core::{Cursor, Health, Instance, Member, Snapshot, Variant};

use crate::api::{CatalogApi, HealthEntry};
use crate::CatalogError;

/// Default long-poll wait.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(180);

/// Turns catalog queries into [`Snapshot`]s.
#[derive(Debug)]
pub struct CatalogObserver<C> {
    api: C,
    exclude: BTreeSet<String>,
    wait: Duration,
}

impl<C: CatalogApi> CatalogObserver<C> {
    /// Create an observer that skips the `exclude`d service names.
    pub fn new<I, S>(api: C, exclude: I, wait: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            api,
            exclude: exclude.into_iter().map(Into::into).collect(),
            wait,
        }
    }

    /// Wait for a change past `cursor` and return the new cursor with the full
    /// membership observed at that point.
    pub async fn observe(&self, cursor: Option<&Cursor>) -> Result<(Cursor, Snapshot), CatalogError> {
        let (next, services) = self.api.services(cursor, self.wait).await?;
        debug!("catalog reported {} services at index {}", services.len(), next);

        let mut snapshot = Snapshot::new();
        for service in services.keys().filter(|name| !self.exclude.contains(*name)) {
            let (_, entries) = self.api.health(service).await?;
            for entry in &entries {
                absorb(&mut snapshot, service, entry);
            }
        }

        Ok((next, snapshot))
    }
}

/// Normalize a health entry into an instance.
///
/// Returns `None` when no check is bound to the instance itself. Node-level
/// checks never count.
pub fn normalize(service: &str, entry: &HealthEntry) -> Option<Instance> {
    let check = entry
        .checks
        .iter()
        .find(|check| check.service_id == entry.service.id)?;

    let tags = entry.service.tags.as_deref().unwrap_or_default();

    Some(Instance {
        service: service.to_string(),
        member: Member::new(entry.node.address.clone(), entry.service.port),
        health: Health::from_status(&check.status),
        variant: Variant::from_tags(tags),
    })
}

fn absorb(snapshot: &mut Snapshot, service: &str, entry: &HealthEntry) {
    let Some(instance) = normalize(service, entry) else {
        error!(
            "{} instance {}:{} doesn't have a health check defined",
            service, entry.node.address, entry.service.port
        );
        return;
    };

    let pool = instance.pool_name();
    let members = snapshot.ensure_pool(&pool);

    if instance.health.is_passing() {
        info!("{} server {} is passing, adding to upstream", pool, instance.member);
        members.insert(instance.member);
    } else {
        warn!(
            "{} server {} is {}, leaving it out of the upstream",
            pool, instance.member, instance.health
        );
    }
}
