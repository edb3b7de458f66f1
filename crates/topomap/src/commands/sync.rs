//! One-shot viewport synchronization.

use chrono::{DateTime, Utc};
use serde::Serialize;

use topomap_core::{Bbox, EngineConfig, Totals};

use crate::cli::{GlobalOpts, ViewArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct SyncSummary {
    bbox: Bbox,
    zoom: f64,
    outcome: String,
    nodes: usize,
    links: usize,
    zones: usize,
    totals: Totals,
    synced_at: Option<DateTime<Utc>>,
}

fn detail(s: &SyncSummary) -> String {
    [
        format!("Viewport: {} @ z{:.0}", s.bbox, s.zoom),
        format!("Outcome:  {}", s.outcome),
        format!("Nodes:    {} of {}", s.nodes, s.totals.nodes),
        format!("Links:    {} of {}", s.links, s.totals.links),
        format!("Zones:    {} of {}", s.zones, s.totals.zones),
        format!(
            "Synced:   {}",
            s.synced_at
                .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        ),
    ]
    .join("\n")
}

pub async fn handle(
    engine: EngineConfig,
    view: &ViewArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (session, outcome) = util::open_view(engine, view).await?;
    let store = session.store();
    let viewport = session
        .current_query()
        .map(|q| q.viewport())
        .ok_or_else(|| CliError::Internal("no viewport after synchronization".into()))?;

    let summary = SyncSummary {
        bbox: viewport.bbox,
        zoom: viewport.zoom,
        outcome: outcome.to_string(),
        nodes: store.node_count(),
        links: store.link_count(),
        zones: store.zone_count(),
        totals: store.totals(),
        synced_at: store.last_sync(),
    };
    session.shutdown().await;

    let out = output::render_single(&global.output, &summary, detail, |s| {
        format!("{} {} {}", s.nodes, s.links, s.zones)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
