// ── Viewport queries and cache keys ──

use serde::{Deserialize, Serialize};
use topomap_api::ListParams;

use crate::viewport::{Bbox, ViewportChange};

/// Text, status and kind filters applied to every list query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub text: Option<String>,
    pub status: Option<String>,
    pub kind: Option<String>,
}

fn filter_key(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_owned()).unwrap_or_default()
}

/// Everything needed to fetch one viewport's worth of topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportQuery {
    pub filters: Filters,
    pub bbox: Bbox,
    pub zoom: f64,
    pub page: u32,
    pub page_size: u32,
}

impl ViewportQuery {
    pub fn new(filters: Filters, viewport: ViewportChange, page_size: u32) -> Self {
        Self {
            filters,
            bbox: viewport.bbox,
            zoom: viewport.zoom,
            page: 1,
            page_size,
        }
    }

    pub fn viewport(&self) -> ViewportChange {
        ViewportChange {
            bbox: self.bbox,
            zoom: self.zoom,
        }
    }

    /// Cache key: filters, bbox text and coarse zoom.
    pub fn key(&self) -> QueryKey {
        QueryKey {
            text: filter_key(self.filters.text.as_deref()),
            status: filter_key(self.filters.status.as_deref()),
            kind: filter_key(self.filters.kind.as_deref()),
            bbox: self.bbox.to_string(),
            zoom: self.viewport().zoom_signature(),
        }
    }

    pub fn to_list_params(&self) -> ListParams {
        ListParams {
            q: self.filters.text.clone(),
            status: self.filters.status.clone(),
            kind: self.filters.kind.clone(),
            bbox: self.bbox.to_string(),
            page: self.page,
            per_page: self.page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    text: String,
    status: String,
    kind: String,
    bbox: String,
    zoom: String,
}
