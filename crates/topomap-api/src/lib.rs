//! Async HTTP client for the topology backend.
//!
//! The backend owns the canonical schema for nodes, links, coverage zones
//! and zone bindings. This crate speaks its JSON REST surface:
//!
//! - paged list queries filtered by text, status, kind and a
//!   `west,south,east,north` bounding box ([`ListParams`] → [`Page`])
//! - create / update / delete per entity kind
//! - zone-binding mutations keyed by `(zone_id, node_id)`
//!
//! DTOs here are deliberately loose (enum fields are strings, geometry is
//! raw JSON). `topomap-core` converts them into the typed domain model.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::TopologyClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use types::{
    LinkPayload, LinkResponse, ListParams, NodePayload, NodeResponse, Page, ZoneBindingPayload,
    ZoneBindingResponse, ZoneBindingUpdate, ZonePayload, ZoneResponse,
};
