// ── CRUD orchestration ──
//
// Every mutation goes through here: local validation, the backend call,
// then cache invalidation and a forced resync so the store reflects the
// change without waiting for the next viewport movement. A failed
// mutation never touches the store.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::backend::Backend;
use crate::cache::DataSyncCache;
use crate::command::{
    Command, CommandResult, LinkRequest, NodeRequest, Notification, UpdateZoneBindingRequest,
    ZoneBindingRequest, ZoneRequest,
};
use crate::coordinator::RequestCoordinator;
use crate::error::CoreError;
use crate::model::EntityId;
use crate::query::ViewportQuery;
use crate::store::TopologyStore;

pub struct CrudOrchestrator<B> {
    backend: Arc<B>,
    cache: Arc<DataSyncCache>,
    store: Arc<TopologyStore>,
    coordinator: Arc<RequestCoordinator<B>>,
    query: watch::Receiver<Option<ViewportQuery>>,
    notifications: broadcast::Sender<Notification>,
}

impl<B: Backend> CrudOrchestrator<B> {
    pub fn new(
        backend: Arc<B>,
        coordinator: Arc<RequestCoordinator<B>>,
        query: watch::Receiver<Option<ViewportQuery>>,
        notifications: broadcast::Sender<Notification>,
    ) -> Self {
        Self {
            backend,
            cache: Arc::clone(coordinator.cache()),
            store: Arc::clone(coordinator.store()),
            coordinator,
            query,
            notifications,
        }
    }

    /// Validate, submit, then invalidate and resync.
    ///
    /// Only the mutation's own failure is returned; a failed follow-up
    /// resync is reported as a notification and leaves the last good state.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if let Err(e) = self.validate(&cmd) {
            self.notify(Notification::error(e.to_string()));
            return Err(e);
        }

        let summary = cmd.describe();
        let binding_zone = cmd.binding_zone().cloned();

        let result = match self.dispatch(cmd).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "mutation failed");
                self.notify(Notification::error(e.to_string()));
                return Err(e);
            }
        };

        info!(%summary, "mutation applied");
        self.notify(Notification::success(summary));
        self.cache.invalidate_all();

        if let Some(zone_id) = binding_zone {
            if let Err(e) = self.coordinator.load_zone_bindings(&zone_id).await {
                warn!(zone = %zone_id, error = %e, "reloading zone bindings failed");
            }
        }

        let query = self.query.borrow().clone();
        if let Some(query) = query {
            if let Err(e) = self.coordinator.force_synchronize(&query).await {
                self.notify(Notification::error(format!("Refresh failed: {e}")));
            }
        }

        Ok(result)
    }

    async fn dispatch(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let b = &self.backend;
        Ok(match cmd {
            Command::CreateNode(req) => CommandResult::Node(b.create_node(&req).await?),
            Command::UpdateNode { id, update } => {
                CommandResult::Node(b.update_node(&id, &update).await?)
            }
            Command::DeleteNode { id } => {
                b.delete_node(&id).await?;
                CommandResult::Ok
            }
            Command::CreateLink(req) => CommandResult::Link(b.create_link(&req).await?),
            Command::UpdateLink { id, update } => {
                CommandResult::Link(b.update_link(&id, &update).await?)
            }
            Command::DeleteLink { id } => {
                b.delete_link(&id).await?;
                CommandResult::Ok
            }
            Command::CreateZone(req) => CommandResult::Zone(b.create_zone(&req).await?),
            Command::UpdateZone { id, update } => {
                CommandResult::Zone(b.update_zone(&id, &update).await?)
            }
            Command::DeleteZone { id } => {
                b.delete_zone(&id).await?;
                CommandResult::Ok
            }
            Command::BindZoneNode { zone_id, binding } => {
                CommandResult::ZoneBinding(b.create_zone_binding(&zone_id, &binding).await?)
            }
            Command::UpdateZoneBinding {
                zone_id,
                node_id,
                update,
            } => CommandResult::ZoneBinding(
                b.update_zone_binding(&zone_id, &node_id, &update)
                    .await?,
            ),
            Command::UnbindZoneNode { zone_id, node_id } => {
                b.delete_zone_binding(&zone_id, &node_id).await?;
                CommandResult::Ok
            }
        })
    }

    fn notify(&self, notification: Notification) {
        // No subscribers is fine; the CLI runs without a toast surface.
        let _ = self.notifications.send(notification);
    }

    // ── Local validation ─────────────────────────────────────────────

    fn validate(&self, cmd: &Command) -> Result<(), CoreError> {
        match cmd {
            Command::CreateNode(req) | Command::UpdateNode { update: req, .. } => {
                validate_node(req)
            }
            Command::CreateLink(req) => self.validate_link(req, None),
            Command::UpdateLink { id, update } => self.validate_link(update, Some(id)),
            Command::CreateZone(req) | Command::UpdateZone { update: req, .. } => {
                validate_zone(req)
            }
            Command::BindZoneNode { binding, .. } => validate_binding(binding),
            Command::UpdateZoneBinding { update, .. } => validate_binding_update(update),
            Command::DeleteNode { .. }
            | Command::DeleteLink { .. }
            | Command::DeleteZone { .. }
            | Command::UnbindZoneNode { .. } => Ok(()),
        }
    }

    fn validate_link(&self, req: &LinkRequest, editing: Option<&EntityId>) -> Result<(), CoreError> {
        require_name(&req.name)?;
        if req.from_node == req.to_node {
            return Err(CoreError::validation(
                "a link cannot start and end on the same node",
            ));
        }
        if let Some(existing) = self
            .store
            .find_link_between(&req.from_node, &req.to_node, editing)
        {
            return Err(CoreError::validation(format!(
                "nodes {} and {} are already connected by link \"{}\"",
                req.from_node, req.to_node, existing.name
            )));
        }
        if req.priority == 0 {
            return Err(CoreError::validation("priority must be a positive integer"));
        }
        for (field, value) in req.metrics() {
            if let Some(v) = value {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(CoreError::validation(format!(
                        "{field} must be a non-negative number, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn require_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::validation("name must not be empty"));
    }
    Ok(())
}

fn validate_node(req: &NodeRequest) -> Result<(), CoreError> {
    require_name(&req.name)?;
    if !(req.lat.is_finite() && (-90.0..=90.0).contains(&req.lat)) {
        return Err(CoreError::validation(format!(
            "latitude must be between -90 and 90, got {}",
            req.lat
        )));
    }
    if !(req.lng.is_finite() && (-180.0..=180.0).contains(&req.lng)) {
        return Err(CoreError::validation(format!(
            "longitude must be between -180 and 180, got {}",
            req.lng
        )));
    }
    Ok(())
}

fn validate_zone(req: &ZoneRequest) -> Result<(), CoreError> {
    require_name(&req.name)
}

fn validate_binding(req: &ZoneBindingRequest) -> Result<(), CoreError> {
    if req.weight == 0 {
        return Err(CoreError::validation("weight must be a positive integer"));
    }
    Ok(())
}

fn validate_binding_update(req: &UpdateZoneBindingRequest) -> Result<(), CoreError> {
    if req.weight == Some(0) {
        return Err(CoreError::validation("weight must be a positive integer"));
    }
    Ok(())
}
