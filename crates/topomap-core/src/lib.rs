//! Viewport-driven topology sync and link-drawing engine.
//!
//! This crate owns the domain model and the reactive data layer behind a
//! network operator's map console:
//!
//! - **[`Session`]**: context object constructed once per console. Exposes
//!   the event interface (`on_viewport_changed`, `on_node_clicked`,
//!   `on_map_clicked`, `on_node_dragged`) and owns every component below.
//!
//! - **[`ViewportTracker`]**: normalizes the visible extent into a
//!   [`Bbox`] with a minimum span and debounces bursts of movement.
//!
//! - **[`DataSyncCache`]** and **[`RequestCoordinator`]**: short-TTL,
//!   FIFO-bounded result cache plus sequence-numbered, cancellable fetches.
//!   A stale response is never applied.
//!
//! - **[`TopologyStore`]**: reactive storage (`DashMap` + `tokio::sync::watch`)
//!   for nodes, links, zones and zone bindings, with [`Subscription`]
//!   handles for UI consumers.
//!
//! - **[`LinkDrawing`]**: the interactive link-drawing state machine.
//!
//! - **[`CrudOrchestrator`]**: validated mutations through a typed
//!   [`Command`] enum, followed by cache invalidation and a forced resync.
//!
//! - **[`health::score`]** and **[`geometry`]**: pure link-health scoring and
//!   the GeoJSON codec.

pub mod backend;
pub mod cache;
pub mod command;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod crud;
pub mod drawing;
pub mod error;
pub mod geometry;
pub mod health;
pub mod model;
pub mod query;
pub mod session;
pub mod store;
pub mod viewport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{Backend, HttpBackend, Listing};
pub use cache::DataSyncCache;
pub use command::requests::*;
pub use command::{Command, CommandResult, Notification, NotificationLevel};
pub use config::EngineConfig;
pub use coordinator::{RequestCoordinator, SyncOutcome};
pub use crud::CrudOrchestrator;
pub use drawing::{
    CommittedLink, DraftMarker, DraftPreview, DrawError, DrawMode, DrawPhase, DrawStep,
    LinkDrawing, MarkerRole,
};
pub use error::CoreError;
pub use geometry::{Area, Coordinate, Geometry, GeometryKind, GeometryParseError, LineString};
pub use health::{HealthTone, LinkHealth};
pub use query::{Filters, QueryKey, ViewportQuery};
pub use session::Session;
pub use store::{Subscription, SubscriptionStream, TopologySnapshot, TopologyStore, Totals};
pub use viewport::{Bbox, ViewportChange, ViewportTracker};

pub use model::{EntityId, Link, LinkStatus, LinkType, Node, NodeStatus, NodeType, Zone, ZoneBinding};
