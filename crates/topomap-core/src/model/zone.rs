// ── Coverage zones ──

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use crate::geometry::Area;

/// A coverage or service area.
///
/// Zone type and status vocabularies are owned by the backend and kept
/// as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: String,
    pub status: String,
    pub priority: u32,
    pub geometry: Area,
}

/// Association of a zone with a node.
///
/// `(zone_id, node_id)` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBinding {
    pub zone_id: EntityId,
    pub node_id: EntityId,
    pub is_primary: bool,
    pub weight: u32,
}

impl ZoneBinding {
    pub fn key(&self) -> (EntityId, EntityId) {
        (self.zone_id.clone(), self.node_id.clone())
    }
}
