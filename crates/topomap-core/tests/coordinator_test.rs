#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use topomap_core::{
    Bbox, DataSyncCache, Filters, RequestCoordinator, SyncOutcome, TopologyStore, ViewportChange,
    ViewportQuery,
};

use common::{EAST, FakeBackend, WEST, id, square_zone, two_region_backend};

const TTL: Duration = Duration::from_secs(20);

fn coordinator(backend: &FakeBackend) -> RequestCoordinator<FakeBackend> {
    RequestCoordinator::new(
        Arc::new(backend.clone()),
        Arc::new(DataSyncCache::new(TTL, 40)),
        Arc::new(TopologyStore::new()),
    )
}

fn query(bbox: Bbox) -> ViewportQuery {
    ViewportQuery::new(Filters::default(), ViewportChange { bbox, zoom: 12.0 }, 1000)
}

fn node_ids(c: &RequestCoordinator<FakeBackend>) -> Vec<String> {
    c.store()
        .nodes_snapshot()
        .iter()
        .map(|n| n.id.to_string())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn late_stale_response_never_overwrites_newer_state() {
    let backend = two_region_backend();
    let c = coordinator(&backend);

    // Warm the cache for the east view so the newer request is a hit.
    assert_eq!(c.synchronize(&query(EAST)).await.unwrap(), SyncOutcome::Applied);
    backend.set_latency(WEST, Duration::from_millis(500));

    let west = query(WEST);
    let (older, newer) = tokio::join!(c.synchronize(&west), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        c.synchronize(&query(EAST)).await
    });

    assert_eq!(newer.unwrap(), SyncOutcome::CacheHit);
    assert_eq!(older.unwrap(), SyncOutcome::Superseded);
    assert_eq!(node_ids(&c), vec!["e1", "e2"]);
    assert_eq!(c.latest_request_id(), 3);
}

#[tokio::test(start_paused = true)]
async fn newer_miss_cancels_older_fetch() {
    let backend = two_region_backend();
    let c = coordinator(&backend);
    backend.set_latency(WEST, Duration::from_millis(500));
    backend.set_latency(EAST, Duration::from_millis(50));

    let started = tokio::time::Instant::now();
    let (older, newer) = tokio::join!(
        async {
            let outcome = c.synchronize(&query(WEST)).await;
            (outcome, started.elapsed())
        },
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            c.synchronize(&query(EAST)).await
        }
    );

    let (older, older_elapsed) = older;
    assert_eq!(older.unwrap(), SyncOutcome::Superseded);
    assert!(older_elapsed < Duration::from_millis(500));
    assert_eq!(newer.unwrap(), SyncOutcome::Applied);
    assert_eq!(node_ids(&c), vec!["e1", "e2"]);
    assert_eq!(c.cache().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cache_serves_repeat_queries_until_ttl() {
    let backend = two_region_backend();
    let c = coordinator(&backend);

    assert_eq!(c.synchronize(&query(WEST)).await.unwrap(), SyncOutcome::Applied);
    assert_eq!(c.synchronize(&query(EAST)).await.unwrap(), SyncOutcome::Applied);
    assert_eq!(c.synchronize(&query(WEST)).await.unwrap(), SyncOutcome::CacheHit);
    assert_eq!(node_ids(&c), vec!["w1", "w2"]);
    assert_eq!(backend.list_calls(), 2);

    tokio::time::advance(TTL + Duration::from_millis(1)).await;
    assert_eq!(c.synchronize(&query(WEST)).await.unwrap(), SyncOutcome::Applied);
    assert_eq!(backend.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn forced_sync_bypasses_cache() {
    let backend = two_region_backend();
    let c = coordinator(&backend);

    c.synchronize(&query(WEST)).await.unwrap();
    assert_eq!(
        c.force_synchronize(&query(WEST)).await.unwrap(),
        SyncOutcome::Applied
    );
    assert_eq!(backend.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn failure_keeps_last_good_state_and_advances_sequence() {
    let backend = two_region_backend();
    let c = coordinator(&backend);
    c.synchronize(&query(WEST)).await.unwrap();

    backend.fail_lists(true);
    let err = c.synchronize(&query(EAST)).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(node_ids(&c), vec!["w1", "w2"]);
    assert_eq!(c.latest_request_id(), 2);
    assert_eq!(c.cache().len(), 1);

    backend.fail_lists(false);
    assert_eq!(c.synchronize(&query(EAST)).await.unwrap(), SyncOutcome::Applied);
    assert_eq!(node_ids(&c), vec!["e1", "e2"]);
}

#[tokio::test(start_paused = true)]
async fn totals_and_zones_are_applied() {
    let backend = two_region_backend().with_zones([square_zone("z1", 0.1, 0.1, 0.5)]);
    let c = coordinator(&backend);
    c.synchronize(&query(WEST)).await.unwrap();

    let totals = c.store().totals();
    assert_eq!((totals.nodes, totals.links, totals.zones), (2, 0, 1));
    assert!(c.store().zone(&id("z1")).is_some());
}

#[tokio::test(start_paused = true)]
async fn zone_bindings_load_per_zone() {
    let backend = two_region_backend()
        .with_zones([square_zone("z1", 0.1, 0.1, 0.5)])
        .with_bindings([topomap_core::ZoneBinding {
            zone_id: id("z1"),
            node_id: id("w1"),
            is_primary: true,
            weight: 3,
        }]);
    let c = coordinator(&backend);
    c.synchronize(&query(WEST)).await.unwrap();

    assert_eq!(c.load_zone_bindings(&id("z1")).await.unwrap(), 1);
    let bindings = c.store().bindings_for_node(&id("w1"));
    assert_eq!(bindings.len(), 1);
    assert!(bindings[0].is_primary);
    assert_eq!(bindings[0].weight, 3);
}
