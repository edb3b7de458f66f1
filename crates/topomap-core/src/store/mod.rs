// ── Topology store ──
//
// In-memory nodes, links, zones and zone bindings for the active
// viewport. Written only by the request coordinator and the CRUD
// orchestrator; everyone else reads snapshots or subscribes.

mod collection;
mod refresh;
mod subscription;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::health::{self, LinkHealth};
use crate::model::{EntityId, Link, Node, Zone, ZoneBinding};
use collection::EntityCollection;

pub use refresh::{Totals, TopologySnapshot};
pub use subscription::{Subscription, SubscriptionStream};

pub struct TopologyStore {
    pub(crate) nodes: EntityCollection<EntityId, Node>,
    pub(crate) links: EntityCollection<EntityId, Link>,
    pub(crate) zones: EntityCollection<EntityId, Zone>,
    pub(crate) bindings: EntityCollection<(EntityId, EntityId), ZoneBinding>,
    pub(crate) totals: watch::Sender<Totals>,
    pub(crate) last_sync: watch::Sender<Option<DateTime<Utc>>>,
}

impl TopologyStore {
    pub fn new() -> Self {
        let (totals, _) = watch::channel(Totals::default());
        let (last_sync, _) = watch::channel(None);
        Self {
            nodes: EntityCollection::new(),
            links: EntityCollection::new(),
            zones: EntityCollection::new(),
            bindings: EntityCollection::new(),
            totals,
            last_sync,
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn node(&self, id: &EntityId) -> Option<Arc<Node>> {
        self.nodes.get(id)
    }

    pub fn link(&self, id: &EntityId) -> Option<Arc<Link>> {
        self.links.get(id)
    }

    pub fn zone(&self, id: &EntityId) -> Option<Arc<Zone>> {
        self.zones.get(id)
    }

    pub fn zone_binding(&self, zone_id: &EntityId, node_id: &EntityId) -> Option<Arc<ZoneBinding>> {
        self.bindings.get(&(zone_id.clone(), node_id.clone()))
    }

    /// The link joining `a` and `b` in either direction, ignoring `exclude`.
    pub fn find_link_between(
        &self,
        a: &EntityId,
        b: &EntityId,
        exclude: Option<&EntityId>,
    ) -> Option<Arc<Link>> {
        self.links
            .snapshot()
            .iter()
            .find(|l| l.connects(a, b) && exclude != Some(&l.id))
            .cloned()
    }

    pub fn links_touching(&self, node: &EntityId) -> Vec<Arc<Link>> {
        self.links
            .snapshot()
            .iter()
            .filter(|l| l.touches(node))
            .cloned()
            .collect()
    }

    pub fn bindings_for_zone(&self, zone_id: &EntityId) -> Vec<Arc<ZoneBinding>> {
        self.bindings
            .snapshot()
            .iter()
            .filter(|b| &b.zone_id == zone_id)
            .cloned()
            .collect()
    }

    pub fn bindings_for_node(&self, node_id: &EntityId) -> Vec<Arc<ZoneBinding>> {
        self.bindings
            .snapshot()
            .iter()
            .filter(|b| &b.node_id == node_id)
            .cloned()
            .collect()
    }

    /// Links paired with their current health score, derived on read.
    pub fn links_with_health(&self) -> Vec<(Arc<Link>, LinkHealth)> {
        self.links
            .snapshot()
            .iter()
            .map(|l| (Arc::clone(l), health::score(l)))
            .collect()
    }

    // ── Snapshots ────────────────────────────────────────────────────

    pub fn nodes_snapshot(&self) -> Arc<Vec<Arc<Node>>> {
        self.nodes.snapshot()
    }

    pub fn links_snapshot(&self) -> Arc<Vec<Arc<Link>>> {
        self.links.snapshot()
    }

    pub fn zones_snapshot(&self) -> Arc<Vec<Arc<Zone>>> {
        self.zones.snapshot()
    }

    pub fn bindings_snapshot(&self) -> Arc<Vec<Arc<ZoneBinding>>> {
        self.bindings.snapshot()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty() && self.zones.is_empty()
    }

    /// Server-side totals from the last applied synchronization.
    pub fn totals(&self) -> Totals {
        *self.totals.borrow()
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_nodes(&self) -> Subscription<Node> {
        Subscription::new(self.nodes.subscribe())
    }

    pub fn subscribe_links(&self) -> Subscription<Link> {
        Subscription::new(self.links.subscribe())
    }

    pub fn subscribe_zones(&self) -> Subscription<Zone> {
        Subscription::new(self.zones.subscribe())
    }

    pub fn subscribe_bindings(&self) -> Subscription<ZoneBinding> {
        Subscription::new(self.bindings.subscribe())
    }

    pub fn subscribe_last_sync(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_sync.subscribe()
    }

    /// Drop everything, including bindings.
    pub fn clear(&self) {
        self.nodes.clear();
        self.links.clear();
        self.zones.clear();
        self.bindings.clear();
        self.totals.send_replace(Totals::default());
    }
}

impl Default for TopologyStore {
    fn default() -> Self {
        Self::new()
    }
}
