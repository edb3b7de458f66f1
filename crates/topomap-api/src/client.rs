// Async HTTP client for the topology backend REST API.
//
// Base path: /api/v1/
// Auth: optional bearer token (see `TransportConfig`)

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{
    LinkPayload, LinkResponse, ListParams, NodePayload, NodeResponse, Page, ZoneBindingPayload,
    ZoneBindingResponse, ZoneBindingUpdate, ZonePayload, ZoneResponse,
};

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the topology backend.
///
/// Every call is a single request; dropping the returned future aborts
/// the request in flight, which is how callers cancel superseded queries.
#[derive(Debug, Clone)]
pub struct TopologyClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TopologyClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL ends with `/api/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| err.message.or(err.error))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        Error::Api {
            message,
            status: status.as_u16(),
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Nodes ────────────────────────────────────────────────────────

    pub async fn list_nodes(&self, params: &ListParams) -> Result<Page<NodeResponse>, Error> {
        self.get_with_params("v1/nodes", &params.to_query()).await
    }

    pub async fn create_node(&self, body: &NodePayload) -> Result<NodeResponse, Error> {
        self.post("v1/nodes", body).await
    }

    pub async fn update_node(&self, id: &str, body: &NodePayload) -> Result<NodeResponse, Error> {
        self.patch(&format!("v1/nodes/{id}"), body).await
    }

    pub async fn delete_node(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("v1/nodes/{id}")).await
    }

    // ── Links ────────────────────────────────────────────────────────

    pub async fn list_links(&self, params: &ListParams) -> Result<Page<LinkResponse>, Error> {
        self.get_with_params("v1/links", &params.to_query()).await
    }

    pub async fn create_link(&self, body: &LinkPayload) -> Result<LinkResponse, Error> {
        self.post("v1/links", body).await
    }

    pub async fn update_link(&self, id: &str, body: &LinkPayload) -> Result<LinkResponse, Error> {
        self.patch(&format!("v1/links/{id}"), body).await
    }

    pub async fn delete_link(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("v1/links/{id}")).await
    }

    // ── Zones ────────────────────────────────────────────────────────

    pub async fn list_zones(&self, params: &ListParams) -> Result<Page<ZoneResponse>, Error> {
        self.get_with_params("v1/zones", &params.to_query()).await
    }

    pub async fn create_zone(&self, body: &ZonePayload) -> Result<ZoneResponse, Error> {
        self.post("v1/zones", body).await
    }

    pub async fn update_zone(&self, id: &str, body: &ZonePayload) -> Result<ZoneResponse, Error> {
        self.patch(&format!("v1/zones/{id}"), body).await
    }

    pub async fn delete_zone(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("v1/zones/{id}")).await
    }

    // ── Zone bindings ────────────────────────────────────────────────

    pub async fn list_zone_bindings(
        &self,
        zone_id: &str,
    ) -> Result<Page<ZoneBindingResponse>, Error> {
        self.get_with_params(&format!("v1/zones/{zone_id}/nodes"), &[])
            .await
    }

    pub async fn create_zone_binding(
        &self,
        zone_id: &str,
        body: &ZoneBindingPayload,
    ) -> Result<ZoneBindingResponse, Error> {
        self.post(&format!("v1/zones/{zone_id}/nodes"), body).await
    }

    pub async fn update_zone_binding(
        &self,
        zone_id: &str,
        node_id: &str,
        body: &ZoneBindingUpdate,
    ) -> Result<ZoneBindingResponse, Error> {
        self.patch(&format!("v1/zones/{zone_id}/nodes/{node_id}"), body)
            .await
    }

    pub async fn delete_zone_binding(&self, zone_id: &str, node_id: &str) -> Result<(), Error> {
        self.delete(&format!("v1/zones/{zone_id}/nodes/{node_id}"))
            .await
    }
}
