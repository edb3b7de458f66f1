// ── Link domain types ──

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::entity_id::EntityId;
use crate::geometry::LineString;

/// Physical or logical medium of a link.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LinkType {
    Fiber,
    WirelessPtp,
    WirelessPtmp,
    Lan,
    VlanTunnel,
    Backhaul,
}

/// Operational state of a link.
///
/// `Inactive` is not offered in the edit forms but some backends still
/// report it for decommissioned-but-not-retired spans.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LinkStatus {
    Planning,
    Up,
    Down,
    Degraded,
    Maintenance,
    Retired,
    Inactive,
}

/// An edge between two nodes.
///
/// At most one link exists per unordered node pair; `from_node` and
/// `to_node` always differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub status: LinkStatus,
    pub from_node: EntityId,
    pub to_node: EntityId,
    pub priority: u32,
    pub capacity_mbps: Option<f64>,
    pub utilization_pct: Option<f64>,
    pub loss_db: Option<f64>,
    pub latency_ms: Option<f64>,
    pub geometry: LineString,
}

impl Link {
    /// Whether this link joins `a` and `b`, in either direction.
    pub fn connects(&self, a: &EntityId, b: &EntityId) -> bool {
        (&self.from_node == a && &self.to_node == b) || (&self.from_node == b && &self.to_node == a)
    }

    /// Whether either endpoint is `node`.
    pub fn touches(&self, node: &EntityId) -> bool {
        &self.from_node == node || &self.to_node == node
    }
}
