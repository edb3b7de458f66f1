// ── Request coordination ──
//
// Decides between cache hit and fetch, cancels superseded fetches, and
// makes sure only the newest request's result ever reaches the store.
// Cancellation is best effort; the sequence check is what guarantees a
// slow, older response can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::cache::DataSyncCache;
use crate::error::CoreError;
use crate::model::EntityId;
use crate::query::ViewportQuery;
use crate::store::{Totals, TopologySnapshot, TopologyStore};

/// How a synchronization request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SyncOutcome {
    /// Served from the cache without a network call.
    CacheHit,
    /// Fetched and applied.
    Applied,
    /// A newer request took over; nothing was applied.
    Superseded,
}

struct InFlight {
    request_id: u64,
    cancel: CancellationToken,
}

pub struct RequestCoordinator<B> {
    backend: Arc<B>,
    cache: Arc<DataSyncCache>,
    store: Arc<TopologyStore>,
    sequence: AtomicU64,
    in_flight: Mutex<Option<InFlight>>,
}

impl<B: Backend> RequestCoordinator<B> {
    pub fn new(backend: Arc<B>, cache: Arc<DataSyncCache>, store: Arc<TopologyStore>) -> Self {
        Self {
            backend,
            cache,
            store,
            sequence: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    /// Synchronize the store with `query`, using the cache when it can.
    pub async fn synchronize(&self, query: &ViewportQuery) -> Result<SyncOutcome, CoreError> {
        self.run(query, false).await
    }

    /// Synchronize bypassing the cache. Used after mutations and for
    /// manual refresh.
    pub async fn force_synchronize(&self, query: &ViewportQuery) -> Result<SyncOutcome, CoreError> {
        self.run(query, true).await
    }

    /// Fetch one zone's bindings and replace them in the store.
    pub async fn load_zone_bindings(&self, zone_id: &EntityId) -> Result<usize, CoreError> {
        let bindings = self.backend.list_zone_bindings(zone_id).await?;
        let count = bindings.len();
        self.store.apply_zone_bindings(zone_id, bindings);
        debug!(zone = %zone_id, count, "loaded zone bindings");
        Ok(count)
    }

    /// Id of the most recently issued request.
    pub fn latest_request_id(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Abort whatever fetch is in flight. Its result will be discarded.
    pub fn cancel_in_flight(&self) {
        if let Some(prev) = self.lock_in_flight().take() {
            prev.cancel.cancel();
            debug!(request_id = prev.request_id, "cancelled in-flight sync");
        }
    }

    pub fn store(&self) -> &Arc<TopologyStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<DataSyncCache> {
        &self.cache
    }

    // ── Internals ────────────────────────────────────────────────────

    async fn run(&self, query: &ViewportQuery, force: bool) -> Result<SyncOutcome, CoreError> {
        let request_id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let key = query.key();

        if !force {
            if let Some(snapshot) = self.cache.get(&key) {
                debug!(request_id, bbox = %query.bbox, "viewport cache hit");
                self.store.apply_snapshot(&snapshot);
                return Ok(SyncOutcome::CacheHit);
            }
        }

        let cancel = CancellationToken::new();
        let previous = self.lock_in_flight().replace(InFlight {
            request_id,
            cancel: cancel.clone(),
        });
        if let Some(prev) = previous {
            prev.cancel.cancel();
            debug!(request_id, superseded = prev.request_id, "cancelled in-flight sync");
        }

        debug!(request_id, bbox = %query.bbox, force, "issuing viewport sync");
        let fetch = async {
            tokio::try_join!(
                self.backend.list_nodes(query),
                self.backend.list_links(query),
                self.backend.list_zones(query),
            )
        };
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = fetch => Some(result),
        };

        self.release(request_id);

        let Some(result) = result else {
            debug!(request_id, "sync cancelled before completion");
            return Ok(SyncOutcome::Superseded);
        };
        if cancel.is_cancelled() || self.latest_request_id() != request_id {
            debug!(
                request_id,
                latest = self.latest_request_id(),
                "discarding stale sync response"
            );
            return Ok(SyncOutcome::Superseded);
        }

        match result {
            Ok((nodes, links, zones)) => {
                let snapshot = Arc::new(TopologySnapshot {
                    totals: Totals {
                        nodes: nodes.total,
                        links: links.total,
                        zones: zones.total,
                    },
                    nodes: nodes.items,
                    links: links.items,
                    zones: zones.items,
                });
                self.cache.set(key, Arc::clone(&snapshot));
                self.store.apply_snapshot(&snapshot);
                info!(
                    request_id,
                    nodes = snapshot.nodes.len(),
                    links = snapshot.links.len(),
                    zones = snapshot.zones.len(),
                    "viewport sync applied"
                );
                Ok(SyncOutcome::Applied)
            }
            Err(e) => {
                warn!(request_id, error = %e, "viewport sync failed; keeping last good state");
                Err(e)
            }
        }
    }

    /// Clear the in-flight slot if it still belongs to `request_id`.
    fn release(&self, request_id: u64) {
        let mut slot = self.lock_in_flight();
        if slot.as_ref().is_some_and(|f| f.request_id == request_id) {
            *slot = None;
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
