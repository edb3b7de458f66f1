// ── Snapshot application ──
//
// Applies fetched viewport results and per-zone binding lists into the
// TopologyStore without passing through an empty state.

use std::collections::HashSet;
use std::hash::Hash;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use super::TopologyStore;
use super::collection::EntityCollection;
use crate::model::{EntityId, Link, Node, Zone, ZoneBinding};

/// Upsert all incoming entities, then prune any existing keys not in the
/// incoming set.
fn upsert_and_prune<K, T>(collection: &EntityCollection<K, T>, items: Vec<(K, T)>) -> usize
where
    K: Eq + Hash + Ord + Clone,
{
    let incoming: HashSet<K> = items.iter().map(|(k, _)| k.clone()).collect();
    collection.upsert_many(items);
    collection.retain(|k| incoming.contains(k))
}

/// Server-reported totals for one query. They can exceed the number of
/// returned items when the page was truncated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub nodes: u64,
    pub links: u64,
    pub zones: u64,
}

/// Result of one synchronization: everything visible in a viewport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologySnapshot {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub zones: Vec<Zone>,
    pub totals: Totals,
}

impl TopologyStore {
    /// Replace the viewport contents with `snap`.
    pub(crate) fn apply_snapshot(&self, snap: &TopologySnapshot) {
        let pruned_nodes = upsert_and_prune(
            &self.nodes,
            snap.nodes.iter().map(|n| (n.id.clone(), n.clone())).collect(),
        );
        let pruned_links = upsert_and_prune(
            &self.links,
            snap.links.iter().map(|l| (l.id.clone(), l.clone())).collect(),
        );
        let pruned_zones = upsert_and_prune(
            &self.zones,
            snap.zones.iter().map(|z| (z.id.clone(), z.clone())).collect(),
        );

        // Bindings of zones that left the viewport go with them.
        let zone_ids: HashSet<&EntityId> = snap.zones.iter().map(|z| &z.id).collect();
        self.bindings.retain(|(zone_id, _)| zone_ids.contains(zone_id));

        self.totals.send_replace(snap.totals);
        self.last_sync.send_replace(Some(Utc::now()));

        debug!(
            nodes = snap.nodes.len(),
            links = snap.links.len(),
            zones = snap.zones.len(),
            pruned_nodes,
            pruned_links,
            pruned_zones,
            "applied topology snapshot"
        );
    }

    /// Replace the bindings of a single zone.
    pub(crate) fn apply_zone_bindings(&self, zone_id: &EntityId, bindings: Vec<ZoneBinding>) {
        let incoming: HashSet<(EntityId, EntityId)> = bindings.iter().map(ZoneBinding::key).collect();
        self.bindings
            .upsert_many(bindings.into_iter().map(|b| (b.key(), b)));
        self.bindings
            .retain(|key| &key.0 != zone_id || incoming.contains(key));
    }
}
