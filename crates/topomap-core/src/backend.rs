// ── Backend collaborator ──
//
// The engine talks to the backend through the `Backend` trait so the
// coordinator and orchestrator can run against an in-memory fake in
// tests. `HttpBackend` is the production adapter over `TopologyClient`.

use std::future::Future;

use topomap_api::{Page, TopologyClient, TransportConfig};
use tracing::warn;

use crate::command::{
    LinkRequest, NodeRequest, UpdateZoneBindingRequest, ZoneBindingRequest, ZoneRequest,
};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::{EntityId, Link, Node, Zone, ZoneBinding};
use crate::query::ViewportQuery;

/// One list response: the items that fit the page plus the server total.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>) -> Self {
        let total = u64::try_from(items.len()).unwrap_or(u64::MAX);
        Self { items, total }
    }
}

/// Queries and mutations the engine needs from the backend.
///
/// Futures are dropped when a request is superseded; implementations
/// must tolerate that.
pub trait Backend: Send + Sync + 'static {
    fn list_nodes(
        &self,
        query: &ViewportQuery,
    ) -> impl Future<Output = Result<Listing<Node>, CoreError>> + Send;

    fn list_links(
        &self,
        query: &ViewportQuery,
    ) -> impl Future<Output = Result<Listing<Link>, CoreError>> + Send;

    fn list_zones(
        &self,
        query: &ViewportQuery,
    ) -> impl Future<Output = Result<Listing<Zone>, CoreError>> + Send;

    fn list_zone_bindings(
        &self,
        zone_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<ZoneBinding>, CoreError>> + Send;

    fn create_node(
        &self,
        req: &NodeRequest,
    ) -> impl Future<Output = Result<Node, CoreError>> + Send;

    fn update_node(
        &self,
        id: &EntityId,
        req: &NodeRequest,
    ) -> impl Future<Output = Result<Node, CoreError>> + Send;

    fn delete_node(&self, id: &EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn create_link(
        &self,
        req: &LinkRequest,
    ) -> impl Future<Output = Result<Link, CoreError>> + Send;

    fn update_link(
        &self,
        id: &EntityId,
        req: &LinkRequest,
    ) -> impl Future<Output = Result<Link, CoreError>> + Send;

    fn delete_link(&self, id: &EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn create_zone(
        &self,
        req: &ZoneRequest,
    ) -> impl Future<Output = Result<Zone, CoreError>> + Send;

    fn update_zone(
        &self,
        id: &EntityId,
        req: &ZoneRequest,
    ) -> impl Future<Output = Result<Zone, CoreError>> + Send;

    fn delete_zone(&self, id: &EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn create_zone_binding(
        &self,
        zone_id: &EntityId,
        req: &ZoneBindingRequest,
    ) -> impl Future<Output = Result<ZoneBinding, CoreError>> + Send;

    fn update_zone_binding(
        &self,
        zone_id: &EntityId,
        node_id: &EntityId,
        req: &UpdateZoneBindingRequest,
    ) -> impl Future<Output = Result<ZoneBinding, CoreError>> + Send;

    fn delete_zone_binding(
        &self,
        zone_id: &EntityId,
        node_id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

// ── HTTP adapter ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: TopologyClient,
}

impl HttpBackend {
    pub fn new(client: TopologyClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            api_token: config.api_token.clone(),
        };
        let client = TopologyClient::new(config.backend.as_str(), &transport)?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &TopologyClient {
        &self.client
    }
}

/// Convert a page, logging and dropping records the model rejects.
fn into_listing<R, T>(page: Page<R>) -> Listing<T>
where
    T: TryFrom<R, Error = CoreError>,
{
    let mut skipped = 0usize;
    let items: Vec<T> = page
        .data
        .into_iter()
        .filter_map(|raw| match T::try_from(raw) {
            Ok(item) => Some(item),
            Err(e) => {
                skipped += 1;
                warn!(error = %e, "skipping malformed backend record");
                None
            }
        })
        .collect();
    let total = page
        .total
        .max(u64::try_from(items.len()).unwrap_or(u64::MAX));
    if skipped > 0 {
        warn!(skipped, kept = items.len(), "backend page contained malformed records");
    }
    Listing { items, total }
}

fn checked<R, T>(raw: R) -> Result<T, CoreError>
where
    T: TryFrom<R, Error = CoreError>,
{
    T::try_from(raw)
}

impl Backend for HttpBackend {
    async fn list_nodes(&self, query: &ViewportQuery) -> Result<Listing<Node>, CoreError> {
        let page = self.client.list_nodes(&query.to_list_params()).await?;
        Ok(into_listing(page))
    }

    async fn list_links(&self, query: &ViewportQuery) -> Result<Listing<Link>, CoreError> {
        let page = self.client.list_links(&query.to_list_params()).await?;
        Ok(into_listing(page))
    }

    async fn list_zones(&self, query: &ViewportQuery) -> Result<Listing<Zone>, CoreError> {
        let page = self.client.list_zones(&query.to_list_params()).await?;
        Ok(into_listing(page))
    }

    async fn list_zone_bindings(&self, zone_id: &EntityId) -> Result<Vec<ZoneBinding>, CoreError> {
        let page = self
            .client
            .list_zone_bindings(&zone_id.to_string())
            .await?;
        Ok(page.data.into_iter().map(ZoneBinding::from).collect())
    }

    async fn create_node(&self, req: &NodeRequest) -> Result<Node, CoreError> {
        checked(self.client.create_node(&req.into()).await?)
    }

    async fn update_node(&self, id: &EntityId, req: &NodeRequest) -> Result<Node, CoreError> {
        checked(self.client.update_node(&id.to_string(), &req.into()).await?)
    }

    async fn delete_node(&self, id: &EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_node(&id.to_string()).await?)
    }

    async fn create_link(&self, req: &LinkRequest) -> Result<Link, CoreError> {
        checked(self.client.create_link(&req.into()).await?)
    }

    async fn update_link(&self, id: &EntityId, req: &LinkRequest) -> Result<Link, CoreError> {
        checked(self.client.update_link(&id.to_string(), &req.into()).await?)
    }

    async fn delete_link(&self, id: &EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_link(&id.to_string()).await?)
    }

    async fn create_zone(&self, req: &ZoneRequest) -> Result<Zone, CoreError> {
        checked(self.client.create_zone(&req.into()).await?)
    }

    async fn update_zone(&self, id: &EntityId, req: &ZoneRequest) -> Result<Zone, CoreError> {
        checked(self.client.update_zone(&id.to_string(), &req.into()).await?)
    }

    async fn delete_zone(&self, id: &EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_zone(&id.to_string()).await?)
    }

    async fn create_zone_binding(
        &self,
        zone_id: &EntityId,
        req: &ZoneBindingRequest,
    ) -> Result<ZoneBinding, CoreError> {
        let created = self
            .client
            .create_zone_binding(&zone_id.to_string(), &req.into())
            .await?;
        Ok(created.into())
    }

    async fn update_zone_binding(
        &self,
        zone_id: &EntityId,
        node_id: &EntityId,
        req: &UpdateZoneBindingRequest,
    ) -> Result<ZoneBinding, CoreError> {
        let updated = self
            .client
            .update_zone_binding(&zone_id.to_string(), &node_id.to_string(), &req.into())
            .await?;
        Ok(updated.into())
    }

    async fn delete_zone_binding(
        &self,
        zone_id: &EntityId,
        node_id: &EntityId,
    ) -> Result<(), CoreError> {
        Ok(self
            .client
            .delete_zone_binding(&zone_id.to_string(), &node_id.to_string())
            .await?)
    }
}
