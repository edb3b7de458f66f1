// ── Topology domain model ──
//
// Typed representations of the backend's entities. Every value here has
// already passed validation: nodes carry finite coordinates, links carry
// a LineString with at least two positions and never loop on one node.

pub mod entity_id;
pub mod link;
pub mod node;
pub mod zone;

pub use entity_id::EntityId;
pub use link::{Link, LinkStatus, LinkType};
pub use node::{Node, NodeStatus, NodeType};
pub use zone::{Zone, ZoneBinding};
