// ── Session context ──
//
// One `Session` per open console. It owns the store, cache, coordinator,
// orchestrator, viewport tracker and drawing state, and exposes the event
// interface the map surface calls into. Fresh sessions share nothing, so
// tests get clean isolation by constructing a new one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::{Backend, HttpBackend};
use crate::cache::DataSyncCache;
use crate::command::{Command, CommandResult, LinkRequest, NodeRequest, Notification};
use crate::config::EngineConfig;
use crate::coordinator::{RequestCoordinator, SyncOutcome};
use crate::crud::CrudOrchestrator;
use crate::drawing::{
    CommittedLink, DrawError, DrawMode, DrawPhase, DrawStep, DraftPreview, LinkDrawing,
};
use crate::error::CoreError;
use crate::geometry::Coordinate;
use crate::model::EntityId;
use crate::query::{Filters, ViewportQuery};
use crate::store::TopologyStore;
use crate::viewport::{Bbox, ViewportChange, ViewportTracker};

const NOTIFICATION_CHANNEL_SIZE: usize = 64;

/// Cheaply cloneable handle to one console session.
pub struct Session<B: Backend> {
    inner: Arc<SessionInner<B>>,
}

impl<B: Backend> Clone for Session<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<B: Backend> {
    config: EngineConfig,
    store: Arc<TopologyStore>,
    cache: Arc<DataSyncCache>,
    coordinator: Arc<RequestCoordinator<B>>,
    crud: CrudOrchestrator<B>,
    tracker: ViewportTracker,
    filters: watch::Sender<Filters>,
    query: watch::Sender<Option<ViewportQuery>>,
    notifications: broadcast::Sender<Notification>,
    drawing: Mutex<LinkDrawing>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Session<HttpBackend> {
    /// Session against the HTTP backend described by `config`.
    pub fn connect(config: EngineConfig) -> Result<Self, CoreError> {
        let backend = HttpBackend::from_config(&config)?;
        Self::new(config, backend)
    }
}

impl<B: Backend> Session<B> {
    /// Build a session and spawn its background tasks. Must be called
    /// inside a Tokio runtime.
    pub fn new(config: EngineConfig, backend: B) -> Result<Self, CoreError> {
        config.validate()?;

        let backend = Arc::new(backend);
        let store = Arc::new(TopologyStore::new());
        let cache = Arc::new(DataSyncCache::new(config.cache_ttl, config.cache_capacity));
        let coordinator = Arc::new(RequestCoordinator::new(
            Arc::clone(&backend),
            Arc::clone(&cache),
            Arc::clone(&store),
        ));
        let (query, query_rx) = watch::channel(None);
        let (filters, _) = watch::channel(Filters::default());
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        let crud = CrudOrchestrator::new(
            backend,
            Arc::clone(&coordinator),
            query_rx,
            notifications.clone(),
        );

        let cancel = CancellationToken::new();
        let (tracker, settled, debounce_handle) =
            ViewportTracker::spawn(config.debounce, config.min_span_deg, cancel.clone());

        let session = Self {
            inner: Arc::new(SessionInner {
                config,
                store,
                cache,
                coordinator,
                crud,
                tracker,
                filters,
                query,
                notifications,
                drawing: Mutex::new(LinkDrawing::default()),
                cancel: cancel.clone(),
                task_handles: Mutex::new(Vec::new()),
            }),
        };

        let viewport_handle = tokio::spawn(viewport_task(
            Arc::downgrade(&session.inner),
            settled,
            cancel,
        ));
        session
            .lock_handles()
            .extend([debounce_handle, viewport_handle]);

        Ok(session)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<TopologyStore> {
        &self.inner.store
    }

    pub fn cache(&self) -> &Arc<DataSyncCache> {
        &self.inner.cache
    }

    pub fn coordinator(&self) -> &Arc<RequestCoordinator<B>> {
        &self.inner.coordinator
    }

    /// Subscribe to success and error notifications.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    /// The query of the most recent settled view.
    pub fn current_query(&self) -> Option<ViewportQuery> {
        self.inner.query.borrow().clone()
    }

    pub fn subscribe_query(&self) -> watch::Receiver<Option<ViewportQuery>> {
        self.inner.query.subscribe()
    }

    pub fn filters(&self) -> Filters {
        self.inner.filters.borrow().clone()
    }

    // ── Map events ───────────────────────────────────────────────────

    /// The visible extent moved. Synchronization follows once movement
    /// pauses for the debounce delay.
    pub fn on_viewport_changed(&self, bbox: Bbox, zoom: f64) -> ViewportChange {
        self.inner.tracker.on_view_changed(bbox, zoom)
    }

    /// Replace the filters and synchronize right away.
    pub fn set_filters(&self, filters: Filters) {
        self.inner.filters.send_replace(filters);
        if let Some(view) = self.inner.tracker.last() {
            let query = self.publish_query(view);
            self.spawn_sync(query);
        }
    }

    /// A node was clicked. Only meaningful while drawing a link.
    pub fn on_node_clicked(&self, node_id: &EntityId) -> Result<DrawStep, DrawError> {
        self.lock_drawing()
            .on_node_clicked(&self.inner.store, node_id)
    }

    /// Empty map was clicked.
    pub fn on_map_clicked(&self, at: Coordinate) -> DrawStep {
        self.lock_drawing().on_map_clicked(at)
    }

    pub fn on_pointer_moved(&self, at: Option<Coordinate>) {
        self.lock_drawing().on_pointer_moved(at);
    }

    /// A node marker was dropped at a new position.
    pub async fn on_node_dragged(
        &self,
        node_id: &EntityId,
        to: Coordinate,
    ) -> Result<CommandResult, CoreError> {
        let node = self
            .inner
            .store
            .node(node_id)
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "Node".into(),
                identifier: node_id.to_string(),
            })?;
        let update = NodeRequest {
            name: node.name.clone(),
            node_type: node.node_type,
            status: node.status,
            lat: to.lat,
            lng: to.lng,
        };
        self.execute(Command::UpdateNode {
            id: node_id.clone(),
            update,
        })
        .await
    }

    // ── Link drawing ─────────────────────────────────────────────────

    pub fn start_drawing(&self, mode: DrawMode) {
        let mut drawing = self.lock_drawing();
        drawing.set_mode(mode);
        drawing.start();
    }

    pub fn start_editing_link(&self, link_id: EntityId, mode: DrawMode) {
        let mut drawing = self.lock_drawing();
        drawing.set_mode(mode);
        drawing.start_edit(link_id);
    }

    pub fn set_draw_mode(&self, mode: DrawMode) {
        self.lock_drawing().set_mode(mode);
    }

    pub fn undo_bend(&self) -> Option<Coordinate> {
        self.lock_drawing().undo()
    }

    pub fn cancel_drawing(&self) -> bool {
        self.lock_drawing().cancel()
    }

    pub fn drawing_phase(&self) -> DrawPhase {
        self.lock_drawing().phase()
    }

    pub fn draft_preview(&self) -> DraftPreview {
        self.lock_drawing().preview()
    }

    /// Submit the form for a committed draft. Endpoints and geometry come
    /// from the draft; the rest from `attributes`.
    pub async fn submit_link(
        &self,
        draft: CommittedLink,
        attributes: LinkRequest,
    ) -> Result<CommandResult, CoreError> {
        let request = LinkRequest {
            from_node: draft.from_node,
            to_node: draft.to_node,
            geometry: draft.geometry,
            ..attributes
        };
        let cmd = match draft.editing {
            Some(id) => Command::UpdateLink {
                id,
                update: request,
            },
            None => Command::CreateLink(request),
        };
        self.execute(cmd).await
    }

    // ── Data operations ──────────────────────────────────────────────

    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        self.inner.crud.execute(cmd).await
    }

    /// Synchronize a view immediately, skipping the debounce.
    pub async fn synchronize_view(&self, bbox: Bbox, zoom: f64) -> Result<SyncOutcome, CoreError> {
        let view = self.inner.tracker.record(bbox, zoom);
        let query = self.publish_query(view);
        self.inner.coordinator.synchronize(&query).await
    }

    /// Re-fetch the current view, bypassing the cache. `None` if no view
    /// has settled yet.
    pub async fn refresh(&self) -> Result<Option<SyncOutcome>, CoreError> {
        let Some(query) = self.current_query() else {
            return Ok(None);
        };
        self.inner
            .coordinator
            .force_synchronize(&query)
            .await
            .map(Some)
    }

    pub async fn load_zone_bindings(&self, zone_id: &EntityId) -> Result<usize, CoreError> {
        self.inner.coordinator.load_zone_bindings(zone_id).await
    }

    /// Stop background tasks and abandon any in-flight fetch.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.coordinator.cancel_in_flight();
        let handles: Vec<_> = self.lock_handles().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        debug!("session shut down");
    }

    // ── Internals ────────────────────────────────────────────────────

    fn publish_query(&self, view: ViewportChange) -> ViewportQuery {
        let query = ViewportQuery::new(self.filters(), view, self.inner.config.page_size);
        self.inner.query.send_replace(Some(query.clone()));
        query
    }

    fn spawn_sync(&self, query: ViewportQuery) {
        let session = self.clone();
        tokio::spawn(async move {
            match session.inner.coordinator.synchronize(&query).await {
                Ok(outcome) => debug!(%outcome, "background sync finished"),
                Err(e) => {
                    warn!(error = %e, "background sync failed");
                    let _ = session
                        .inner
                        .notifications
                        .send(Notification::error(format!("Sync failed: {e}")));
                }
            }
        });
    }

    fn lock_drawing(&self) -> MutexGuard<'_, LinkDrawing> {
        self.inner
            .drawing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_handles(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.inner
            .task_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: Backend> Drop for SessionInner<B> {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.coordinator.cancel_in_flight();
    }
}

/// Turns each settled viewport into a synchronization. Holds the session
/// weakly so dropping the last handle ends the task.
async fn viewport_task<B: Backend>(
    inner: Weak<SessionInner<B>>,
    mut settled: mpsc::UnboundedReceiver<ViewportChange>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            change = settled.recv() => {
                let Some(change) = change else { break };
                let Some(inner) = inner.upgrade() else { break };
                let session = Session { inner };
                let query = session.publish_query(change);
                session.spawn_sync(query);
            }
        }
    }
}
