// ── API-to-domain type conversions ──
//
// Bridges the loose `topomap_api` wire types into the typed model and
// back. Incoming records that fail validation become
// `CoreError::InvalidRecord`; the backend adapter logs and skips them.

use std::str::FromStr;

use serde::Deserialize;
use topomap_api::{
    LinkPayload, LinkResponse, NodePayload, NodeResponse, ZoneBindingPayload, ZoneBindingResponse,
    ZoneBindingUpdate, ZonePayload, ZoneResponse,
};

use crate::command::{
    LinkRequest, NodeRequest, UpdateZoneBindingRequest, ZoneBindingRequest, ZoneRequest,
};
use crate::error::CoreError;
use crate::geometry::{self, Area, Geometry, LineString};
use crate::model::{EntityId, Link, Node, Zone, ZoneBinding};

// ── Helpers ────────────────────────────────────────────────────────

fn invalid(entity_type: &'static str, id: &str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidRecord {
        entity_type,
        identifier: id.to_owned(),
        reason: reason.into(),
    }
}

fn parse_field<T: FromStr>(
    entity_type: &'static str,
    id: &str,
    field: &str,
    raw: &str,
) -> Result<T, CoreError> {
    raw.parse()
        .map_err(|_| invalid(entity_type, id, format!("unknown {field} {raw:?}")))
}

// ── Responses → domain ─────────────────────────────────────────────

impl TryFrom<NodeResponse> for Node {
    type Error = CoreError;

    fn try_from(r: NodeResponse) -> Result<Self, Self::Error> {
        let coordinate_ok = r.lat.is_finite()
            && r.lng.is_finite()
            && (-90.0..=90.0).contains(&r.lat)
            && (-180.0..=180.0).contains(&r.lng);
        if !coordinate_ok {
            return Err(invalid(
                "node",
                &r.id,
                format!("coordinates out of range ({}, {})", r.lat, r.lng),
            ));
        }
        Ok(Node {
            node_type: parse_field("node", &r.id, "type", &r.node_type)?,
            status: parse_field("node", &r.id, "status", &r.status)?,
            id: EntityId::from(r.id),
            name: r.name,
            lat: r.lat,
            lng: r.lng,
        })
    }
}

impl TryFrom<LinkResponse> for Link {
    type Error = CoreError;

    fn try_from(r: LinkResponse) -> Result<Self, Self::Error> {
        if r.from_node == r.to_node {
            return Err(invalid("link", &r.id, "link starts and ends on the same node"));
        }
        let geometry = LineString::deserialize(&r.geometry)
            .map_err(|e| invalid("link", &r.id, e.to_string()))?;
        Ok(Link {
            link_type: parse_field("link", &r.id, "type", &r.link_type)?,
            status: parse_field("link", &r.id, "status", &r.status)?,
            id: EntityId::from(r.id),
            name: r.name,
            from_node: EntityId::from(r.from_node),
            to_node: EntityId::from(r.to_node),
            priority: r.priority.unwrap_or(1).max(1),
            capacity_mbps: r.capacity_mbps,
            utilization_pct: r.utilization_pct,
            loss_db: r.loss_db,
            latency_ms: r.latency_ms,
            geometry,
        })
    }
}

impl TryFrom<ZoneResponse> for Zone {
    type Error = CoreError;

    fn try_from(r: ZoneResponse) -> Result<Self, Self::Error> {
        let geometry =
            Area::deserialize(&r.geometry).map_err(|e| invalid("zone", &r.id, e.to_string()))?;
        Ok(Zone {
            id: EntityId::from(r.id),
            name: r.name,
            zone_type: r.zone_type,
            status: r.status,
            priority: r.priority.unwrap_or(1).max(1),
            geometry,
        })
    }
}

impl From<ZoneBindingResponse> for ZoneBinding {
    fn from(r: ZoneBindingResponse) -> Self {
        ZoneBinding {
            zone_id: EntityId::from(r.zone_id),
            node_id: EntityId::from(r.node_id),
            is_primary: r.is_primary,
            weight: r.weight.unwrap_or(1).max(1),
        }
    }
}

// ── Requests → wire payloads ───────────────────────────────────────

impl From<&NodeRequest> for NodePayload {
    fn from(r: &NodeRequest) -> Self {
        NodePayload {
            name: r.name.clone(),
            node_type: r.node_type.to_string(),
            status: r.status.to_string(),
            lat: r.lat,
            lng: r.lng,
        }
    }
}

impl From<&LinkRequest> for LinkPayload {
    fn from(r: &LinkRequest) -> Self {
        LinkPayload {
            name: r.name.clone(),
            link_type: r.link_type.to_string(),
            status: r.status.to_string(),
            from_node: r.from_node.to_string(),
            to_node: r.to_node.to_string(),
            priority: r.priority,
            capacity_mbps: r.capacity_mbps,
            utilization_pct: r.utilization_pct,
            loss_db: r.loss_db,
            latency_ms: r.latency_ms,
            geometry: geometry::to_value(&Geometry::LineString(r.geometry.clone())),
        }
    }
}

impl From<&ZoneRequest> for ZonePayload {
    fn from(r: &ZoneRequest) -> Self {
        ZonePayload {
            name: r.name.clone(),
            zone_type: r.zone_type.clone(),
            status: r.status.clone(),
            priority: r.priority,
            geometry: geometry::to_value(&Geometry::from(r.geometry.clone())),
        }
    }
}

impl From<&ZoneBindingRequest> for ZoneBindingPayload {
    fn from(r: &ZoneBindingRequest) -> Self {
        ZoneBindingPayload {
            node_id: r.node_id.to_string(),
            is_primary: r.is_primary,
            weight: r.weight,
        }
    }
}

impl From<&UpdateZoneBindingRequest> for ZoneBindingUpdate {
    fn from(r: &UpdateZoneBindingRequest) -> Self {
        ZoneBindingUpdate {
            is_primary: r.is_primary,
            weight: r.weight,
        }
    }
}
