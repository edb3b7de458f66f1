// ── Typed request structs for Command payloads ──
//
// Create and update share one shape per entity: the backend treats an
// update as a full replacement of the editable fields.

use serde::{Deserialize, Serialize};

use crate::geometry::{Area, LineString};
use crate::model::{EntityId, LinkStatus, LinkType, NodeStatus, NodeType};

// ── Node ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub status: NodeStatus,
    pub lat: f64,
    pub lng: f64,
}

// ── Link ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub status: LinkStatus,
    pub from_node: EntityId,
    pub to_node: EntityId,
    pub priority: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_mbps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss_db: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    pub geometry: LineString,
}

impl LinkRequest {
    /// A request with default attributes for a freshly drawn link.
    pub fn drawn(from_node: EntityId, to_node: EntityId, geometry: LineString) -> Self {
        Self {
            name: format!("{from_node} - {to_node}"),
            link_type: LinkType::Fiber,
            status: LinkStatus::Planning,
            from_node,
            to_node,
            priority: 1,
            capacity_mbps: None,
            utilization_pct: None,
            loss_db: None,
            latency_ms: None,
            geometry,
        }
    }

    pub(crate) fn metrics(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("capacity_mbps", self.capacity_mbps),
            ("utilization_pct", self.utilization_pct),
            ("loss_db", self.loss_db),
            ("latency_ms", self.latency_ms),
        ]
    }
}

// ── Zone ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: String,
    pub status: String,
    pub priority: u32,
    pub geometry: Area,
}

// ── Zone binding ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBindingRequest {
    pub node_id: EntityId,
    pub is_primary: bool,
    pub weight: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateZoneBindingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}
