// ── Node domain types ──

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::entity_id::EntityId;
use crate::geometry::Coordinate;

/// Role of a node in the access/backbone hierarchy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeType {
    Core,
    Pop,
    Olt,
    Router,
    Tower,
    Ap,
    Splitter,
    CustomerEndpoint,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeStatus {
    Active,
    Inactive,
    Maintenance,
}

/// A physical site on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub status: NodeStatus,
    pub lat: f64,
    pub lng: f64,
}

impl Node {
    /// Map position as a `[lng, lat]` coordinate.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lng, self.lat)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn node_type_parses_snake_case() {
        let t: NodeType = "customer_endpoint".parse().unwrap();
        assert_eq!(t, NodeType::CustomerEndpoint);
        assert_eq!(NodeType::Olt.to_string(), "olt");
    }

    #[test]
    fn coordinate_is_lng_lat() {
        let node = Node {
            id: EntityId::from("a"),
            name: "A".into(),
            node_type: NodeType::Router,
            status: NodeStatus::Active,
            lat: 1.0,
            lng: 2.0,
        };
        let c = node.coordinate();
        assert!((c.lng - 2.0).abs() < f64::EPSILON);
        assert!((c.lat - 1.0).abs() < f64::EPSILON);
    }
}
