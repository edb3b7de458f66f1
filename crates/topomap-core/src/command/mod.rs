// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The CRUD
// orchestrator validates each one locally, routes it to the backend, and
// on success invalidates the cache and resynchronizes the store.

pub mod requests;

use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::model::{EntityId, Link, Node, Zone, ZoneBinding};

pub use requests::{
    LinkRequest, NodeRequest, UpdateZoneBindingRequest, ZoneBindingRequest, ZoneRequest,
};

/// All possible write operations against the backend.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Nodes ────────────────────────────────────────────────────────
    CreateNode(NodeRequest),
    UpdateNode { id: EntityId, update: NodeRequest },
    DeleteNode { id: EntityId },

    // ── Links ────────────────────────────────────────────────────────
    CreateLink(LinkRequest),
    UpdateLink { id: EntityId, update: LinkRequest },
    DeleteLink { id: EntityId },

    // ── Zones ────────────────────────────────────────────────────────
    CreateZone(ZoneRequest),
    UpdateZone { id: EntityId, update: ZoneRequest },
    DeleteZone { id: EntityId },

    // ── Zone bindings, keyed by (zone, node) ─────────────────────────
    BindZoneNode {
        zone_id: EntityId,
        binding: ZoneBindingRequest,
    },
    UpdateZoneBinding {
        zone_id: EntityId,
        node_id: EntityId,
        update: UpdateZoneBindingRequest,
    },
    UnbindZoneNode {
        zone_id: EntityId,
        node_id: EntityId,
    },
}

impl Command {
    /// Past-tense summary used in success notifications.
    pub fn describe(&self) -> String {
        match self {
            Self::CreateNode(r) => format!("Node \"{}\" created", r.name),
            Self::UpdateNode { update, .. } => format!("Node \"{}\" updated", update.name),
            Self::DeleteNode { id } => format!("Node {id} deleted"),
            Self::CreateLink(r) => format!("Link \"{}\" created", r.name),
            Self::UpdateLink { update, .. } => format!("Link \"{}\" updated", update.name),
            Self::DeleteLink { id } => format!("Link {id} deleted"),
            Self::CreateZone(r) => format!("Zone \"{}\" created", r.name),
            Self::UpdateZone { update, .. } => format!("Zone \"{}\" updated", update.name),
            Self::DeleteZone { id } => format!("Zone {id} deleted"),
            Self::BindZoneNode { zone_id, binding } => {
                format!("Node {} bound to zone {zone_id}", binding.node_id)
            }
            Self::UpdateZoneBinding {
                zone_id, node_id, ..
            } => format!("Binding of node {node_id} in zone {zone_id} updated"),
            Self::UnbindZoneNode { zone_id, node_id } => {
                format!("Node {node_id} unbound from zone {zone_id}")
            }
        }
    }

    /// The zone whose bindings this command changes, if any.
    pub fn binding_zone(&self) -> Option<&EntityId> {
        match self {
            Self::BindZoneNode { zone_id, .. }
            | Self::UpdateZoneBinding { zone_id, .. }
            | Self::UnbindZoneNode { zone_id, .. } => Some(zone_id),
            _ => None,
        }
    }
}

/// What the backend handed back for a successful command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Ok,
    Node(Node),
    Link(Link),
    Zone(Zone),
    ZoneBinding(ZoneBinding),
}

// ── Notifications ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient message for the operator, published on a broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}
