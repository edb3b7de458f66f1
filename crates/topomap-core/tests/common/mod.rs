// Shared in-memory backend for the engine's integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use topomap_core::{
    Area, Backend, Bbox, Coordinate, CoreError, EntityId, Link, LinkRequest, LinkStatus, LinkType,
    LineString, Listing, Node, NodeRequest, NodeStatus, NodeType, UpdateZoneBindingRequest,
    ViewportQuery, Zone, ZoneBinding, ZoneBindingRequest, ZoneRequest,
};

#[derive(Default)]
struct World {
    nodes: BTreeMap<EntityId, Node>,
    links: BTreeMap<EntityId, Link>,
    zones: BTreeMap<EntityId, Zone>,
    bindings: BTreeMap<(EntityId, EntityId), ZoneBinding>,
}

#[derive(Default)]
struct State {
    world: Mutex<World>,
    latency: Mutex<HashMap<String, Duration>>,
    list_calls: AtomicUsize,
    binding_calls: AtomicUsize,
    mutation_calls: AtomicUsize,
    fail_lists: AtomicBool,
    fail_mutations: AtomicBool,
    next_id: AtomicU64,
}

/// Cloneable handle; clones share state so a test can keep one after
/// handing another to the engine.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(self, nodes: impl IntoIterator<Item = Node>) -> Self {
        {
            let mut world = self.state.world.lock().unwrap();
            for n in nodes {
                world.nodes.insert(n.id.clone(), n);
            }
        }
        self
    }

    pub fn with_links(self, links: impl IntoIterator<Item = Link>) -> Self {
        {
            let mut world = self.state.world.lock().unwrap();
            for l in links {
                world.links.insert(l.id.clone(), l);
            }
        }
        self
    }

    pub fn with_zones(self, zones: impl IntoIterator<Item = Zone>) -> Self {
        {
            let mut world = self.state.world.lock().unwrap();
            for z in zones {
                world.zones.insert(z.id.clone(), z);
            }
        }
        self
    }

    pub fn with_bindings(self, bindings: impl IntoIterator<Item = ZoneBinding>) -> Self {
        {
            let mut world = self.state.world.lock().unwrap();
            for b in bindings {
                world.bindings.insert(b.key(), b);
            }
        }
        self
    }

    /// Delay every list call for `bbox` by `delay`.
    pub fn set_latency(&self, bbox: Bbox, delay: Duration) {
        self.state
            .latency
            .lock()
            .unwrap()
            .insert(bbox.to_string(), delay);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.state.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.state.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Number of viewport fetches started (one per nodes/links/zones triple).
    pub fn list_calls(&self) -> usize {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    pub fn binding_calls(&self) -> usize {
        self.state.binding_calls.load(Ordering::SeqCst)
    }

    pub fn mutation_calls(&self) -> usize {
        self.state.mutation_calls.load(Ordering::SeqCst)
    }

    pub fn node(&self, id: &str) -> Option<Node> {
        self.state
            .world
            .lock()
            .unwrap()
            .nodes
            .get(&EntityId::from(id))
            .cloned()
    }

    /// Live handles to this backend, including the one under test.
    pub fn handles(&self) -> usize {
        Arc::strong_count(&self.state)
    }

    pub fn link_count(&self) -> usize {
        self.state.world.lock().unwrap().links.len()
    }

    fn allocate(&self, prefix: &str) -> EntityId {
        let n = self.state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        EntityId::from(format!("{prefix}{n}"))
    }

    async fn before_list(&self, query: &ViewportQuery) -> Result<(), CoreError> {
        let delay = self
            .state
            .latency
            .lock()
            .unwrap()
            .get(&query.bbox.to_string())
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.fail_lists.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                message: "upstream unavailable".into(),
                status: Some(503),
            });
        }
        Ok(())
    }

    fn before_mutation(&self) -> Result<(), CoreError> {
        self.state.mutation_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_mutations.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                message: "write rejected".into(),
                status: Some(500),
            });
        }
        Ok(())
    }
}

fn matches_text(query: &ViewportQuery, name: &str) -> bool {
    query
        .filters
        .text
        .as_deref()
        .is_none_or(|t| name.to_lowercase().contains(&t.to_lowercase()))
}

fn area_positions(area: &Area) -> Vec<Coordinate> {
    match area {
        Area::Polygon(p) => p.exterior().to_vec(),
        Area::MultiPolygon(ps) => ps.iter().flat_map(|p| p.exterior().to_vec()).collect(),
    }
}

fn not_found(kind: &str, id: &EntityId) -> CoreError {
    CoreError::NotFound {
        entity_type: kind.into(),
        identifier: id.to_string(),
    }
}

impl Backend for FakeBackend {
    async fn list_nodes(&self, query: &ViewportQuery) -> Result<Listing<Node>, CoreError> {
        self.state.list_calls.fetch_add(1, Ordering::SeqCst);
        self.before_list(query).await?;
        let world = self.state.world.lock().unwrap();
        Ok(Listing::new(
            world
                .nodes
                .values()
                .filter(|n| query.bbox.contains(n.coordinate()) && matches_text(query, &n.name))
                .cloned()
                .collect(),
        ))
    }

    async fn list_links(&self, query: &ViewportQuery) -> Result<Listing<Link>, CoreError> {
        self.before_list(query).await?;
        let world = self.state.world.lock().unwrap();
        Ok(Listing::new(
            world
                .links
                .values()
                .filter(|l| l.geometry.coordinates().iter().any(|c| query.bbox.contains(*c)))
                .cloned()
                .collect(),
        ))
    }

    async fn list_zones(&self, query: &ViewportQuery) -> Result<Listing<Zone>, CoreError> {
        self.before_list(query).await?;
        let world = self.state.world.lock().unwrap();
        Ok(Listing::new(
            world
                .zones
                .values()
                .filter(|z| {
                    area_positions(&z.geometry)
                        .into_iter()
                        .any(|c| query.bbox.contains(c))
                })
                .cloned()
                .collect(),
        ))
    }

    async fn list_zone_bindings(&self, zone_id: &EntityId) -> Result<Vec<ZoneBinding>, CoreError> {
        self.state.binding_calls.fetch_add(1, Ordering::SeqCst);
        let world = self.state.world.lock().unwrap();
        Ok(world
            .bindings
            .values()
            .filter(|b| &b.zone_id == zone_id)
            .cloned()
            .collect())
    }

    async fn create_node(&self, req: &NodeRequest) -> Result<Node, CoreError> {
        self.before_mutation()?;
        let node = Node {
            id: self.allocate("n"),
            name: req.name.clone(),
            node_type: req.node_type,
            status: req.status,
            lat: req.lat,
            lng: req.lng,
        };
        self.state
            .world
            .lock()
            .unwrap()
            .nodes
            .insert(node.id.clone(), node.clone());
        Ok(node)
    }

    async fn update_node(&self, id: &EntityId, req: &NodeRequest) -> Result<Node, CoreError> {
        self.before_mutation()?;
        let mut world = self.state.world.lock().unwrap();
        let node = world.nodes.get_mut(id).ok_or_else(|| not_found("Node", id))?;
        node.name.clone_from(&req.name);
        node.node_type = req.node_type;
        node.status = req.status;
        node.lat = req.lat;
        node.lng = req.lng;
        Ok(node.clone())
    }

    async fn delete_node(&self, id: &EntityId) -> Result<(), CoreError> {
        self.before_mutation()?;
        let mut world = self.state.world.lock().unwrap();
        world.nodes.remove(id).ok_or_else(|| not_found("Node", id))?;
        Ok(())
    }

    async fn create_link(&self, req: &LinkRequest) -> Result<Link, CoreError> {
        self.before_mutation()?;
        let link = link_from_request(self.allocate("l"), req);
        self.state
            .world
            .lock()
            .unwrap()
            .links
            .insert(link.id.clone(), link.clone());
        Ok(link)
    }

    async fn update_link(&self, id: &EntityId, req: &LinkRequest) -> Result<Link, CoreError> {
        self.before_mutation()?;
        let mut world = self.state.world.lock().unwrap();
        if !world.links.contains_key(id) {
            return Err(not_found("Link", id));
        }
        let link = link_from_request(id.clone(), req);
        world.links.insert(id.clone(), link.clone());
        Ok(link)
    }

    async fn delete_link(&self, id: &EntityId) -> Result<(), CoreError> {
        self.before_mutation()?;
        let mut world = self.state.world.lock().unwrap();
        world.links.remove(id).ok_or_else(|| not_found("Link", id))?;
        Ok(())
    }

    async fn create_zone(&self, req: &ZoneRequest) -> Result<Zone, CoreError> {
        self.before_mutation()?;
        let zone = Zone {
            id: self.allocate("z"),
            name: req.name.clone(),
            zone_type: req.zone_type.clone(),
            status: req.status.clone(),
            priority: req.priority,
            geometry: req.geometry.clone(),
        };
        self.state
            .world
            .lock()
            .unwrap()
            .zones
            .insert(zone.id.clone(), zone.clone());
        Ok(zone)
    }

    async fn update_zone(&self, id: &EntityId, req: &ZoneRequest) -> Result<Zone, CoreError> {
        self.before_mutation()?;
        let mut world = self.state.world.lock().unwrap();
        let zone = world.zones.get_mut(id).ok_or_else(|| not_found("Zone", id))?;
        zone.name.clone_from(&req.name);
        zone.geometry = req.geometry.clone();
        Ok(zone.clone())
    }

    async fn delete_zone(&self, id: &EntityId) -> Result<(), CoreError> {
        self.before_mutation()?;
        let mut world = self.state.world.lock().unwrap();
        world.zones.remove(id).ok_or_else(|| not_found("Zone", id))?;
        Ok(())
    }

    async fn create_zone_binding(
        &self,
        zone_id: &EntityId,
        req: &ZoneBindingRequest,
    ) -> Result<ZoneBinding, CoreError> {
        self.before_mutation()?;
        let binding = ZoneBinding {
            zone_id: zone_id.clone(),
            node_id: req.node_id.clone(),
            is_primary: req.is_primary,
            weight: req.weight,
        };
        self.state
            .world
            .lock()
            .unwrap()
            .bindings
            .insert(binding.key(), binding.clone());
        Ok(binding)
    }

    async fn update_zone_binding(
        &self,
        zone_id: &EntityId,
        node_id: &EntityId,
        req: &UpdateZoneBindingRequest,
    ) -> Result<ZoneBinding, CoreError> {
        self.before_mutation()?;
        let mut world = self.state.world.lock().unwrap();
        let binding = world
            .bindings
            .get_mut(&(zone_id.clone(), node_id.clone()))
            .ok_or_else(|| not_found("Zone binding", node_id))?;
        if let Some(p) = req.is_primary {
            binding.is_primary = p;
        }
        if let Some(w) = req.weight {
            binding.weight = w;
        }
        Ok(binding.clone())
    }

    async fn delete_zone_binding(
        &self,
        zone_id: &EntityId,
        node_id: &EntityId,
    ) -> Result<(), CoreError> {
        self.before_mutation()?;
        let mut world = self.state.world.lock().unwrap();
        world
            .bindings
            .remove(&(zone_id.clone(), node_id.clone()))
            .ok_or_else(|| not_found("Zone binding", node_id))?;
        Ok(())
    }
}

fn link_from_request(id: EntityId, req: &LinkRequest) -> Link {
    Link {
        id,
        name: req.name.clone(),
        link_type: req.link_type,
        status: req.status,
        from_node: req.from_node.clone(),
        to_node: req.to_node.clone(),
        priority: req.priority,
        capacity_mbps: req.capacity_mbps,
        utilization_pct: req.utilization_pct,
        loss_db: req.loss_db,
        latency_ms: req.latency_ms,
        geometry: req.geometry.clone(),
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

pub fn node(id: &str, lat: f64, lng: f64) -> Node {
    Node {
        id: EntityId::from(id),
        name: id.to_uppercase(),
        node_type: NodeType::Router,
        status: NodeStatus::Active,
        lat,
        lng,
    }
}

pub fn link_between(id: &str, from: &Node, to: &Node) -> Link {
    Link {
        id: EntityId::from(id),
        name: format!("{}-{}", from.name, to.name),
        link_type: LinkType::Fiber,
        status: LinkStatus::Up,
        from_node: from.id.clone(),
        to_node: to.id.clone(),
        priority: 1,
        capacity_mbps: Some(1000.0),
        utilization_pct: None,
        loss_db: None,
        latency_ms: None,
        geometry: LineString::new(vec![from.coordinate(), to.coordinate()]).unwrap(),
    }
}

pub fn square_zone(id: &str, west: f64, south: f64, size: f64) -> Zone {
    let text = format!(
        r#"{{"type":"Polygon","coordinates":[[[{w},{s}],[{e},{s}],[{e},{n}],[{w},{n}],[{w},{s}]]]}}"#,
        w = west,
        s = south,
        e = west + size,
        n = south + size,
    );
    Zone {
        id: EntityId::from(id),
        name: id.to_uppercase(),
        zone_type: "coverage".into(),
        status: "active".into(),
        priority: 1,
        geometry: topomap_core::geometry::parse_area(&text).unwrap(),
    }
}

pub fn id(s: &str) -> EntityId {
    EntityId::from(s)
}

/// West region `(0,0)-(1,1)` and east region `(10,10)-(11,11)`.
pub const WEST: Bbox = Bbox {
    west: 0.0,
    south: 0.0,
    east: 1.0,
    north: 1.0,
};

pub const EAST: Bbox = Bbox {
    west: 10.0,
    south: 10.0,
    east: 11.0,
    north: 11.0,
};

/// Two nodes in each region.
pub fn two_region_backend() -> FakeBackend {
    FakeBackend::new().with_nodes([
        node("w1", 0.2, 0.2),
        node("w2", 0.8, 0.8),
        node("e1", 10.2, 10.2),
        node("e2", 10.8, 10.8),
    ])
}
