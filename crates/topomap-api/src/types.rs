// Wire types for the topology backend.
//
// Enum-like fields stay as strings and geometry stays as raw JSON; the
// core crate owns the typed model and validation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ── Paging ───────────────────────────────────────────────────────────

/// One page of a list response: `{ data: [...], total: n }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

/// Query parameters shared by every list endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub q: Option<String>,
    pub status: Option<String>,
    pub kind: Option<String>,
    /// `west,south,east,north` in degrees.
    pub bbox: String,
    pub page: u32,
    pub per_page: u32,
}

impl ListParams {
    /// Flatten into `(name, value)` pairs, omitting empty filters.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(6);
        let filters = [("q", &self.q), ("status", &self.status), ("kind", &self.kind)];
        for (name, value) in filters {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push((name, v.to_owned()));
            }
        }
        params.push(("bbox", self.bbox.clone()));
        params.push(("page", self.page.to_string()));
        params.push(("per_page", self.per_page.to_string()));
        params
    }
}

// ── Responses ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NodeResponse {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub status: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkResponse {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub status: String,
    #[serde(deserialize_with = "opaque_id")]
    pub from_node: String,
    #[serde(deserialize_with = "opaque_id")]
    pub to_node: String,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub capacity_mbps: Option<f64>,
    #[serde(default)]
    pub utilization_pct: Option<f64>,
    #[serde(default)]
    pub loss_db: Option<f64>,
    #[serde(default)]
    pub latency_ms: Option<f64>,
    /// GeoJSON object, or GeoJSON text on older backends.
    pub geometry: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneResponse {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: String,
    pub status: String,
    #[serde(default)]
    pub priority: Option<u32>,
    pub geometry: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneBindingResponse {
    #[serde(deserialize_with = "opaque_id")]
    pub zone_id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub node_id: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub weight: Option<u32>,
}

// ── Request bodies ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct NodePayload {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub status: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub status: String,
    pub from_node: String,
    pub to_node: String,
    pub priority: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_mbps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss_db: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    pub geometry: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZonePayload {
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: String,
    pub status: String,
    pub priority: u32,
    pub geometry: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneBindingPayload {
    pub node_id: String,
    pub is_primary: bool,
    pub weight: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ZoneBindingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Backends hand out ids as either strings or integers.
fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or integer id, got {other}"
        ))),
    }
}
