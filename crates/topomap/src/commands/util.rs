//! Shared helpers for command handlers.

use topomap_core::{Bbox, Coordinate, EngineConfig, Filters, HttpBackend, Session, SyncOutcome};

use crate::cli::ViewArgs;
use crate::error::CliError;

pub fn parse_bbox(raw: &str) -> Result<Bbox, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "bbox".into(),
        reason: format!("expected west,south,east,north in degrees, got '{raw}'"),
    })
}

/// Parse a `lng,lat` pair.
pub fn parse_coordinate(raw: &str) -> Result<Coordinate, CliError> {
    let invalid = || CliError::Validation {
        field: "via".into(),
        reason: format!("expected lng,lat in degrees, got '{raw}'"),
    };
    let (lng, lat) = raw.split_once(',').ok_or_else(invalid)?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let at = Coordinate::new(lng, lat);
    if !at.is_finite() {
        return Err(invalid());
    }
    Ok(at)
}

pub fn filters(view: &ViewArgs) -> Filters {
    let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
    Filters {
        text: non_empty(&view.text),
        status: non_empty(&view.status),
        kind: non_empty(&view.kind),
    }
}

/// Open a session and synchronize the requested viewport into its store.
pub async fn open_view(
    engine: EngineConfig,
    view: &ViewArgs,
) -> Result<(Session<HttpBackend>, SyncOutcome), CliError> {
    let bbox = parse_bbox(&view.bbox)?;
    let session = Session::connect(engine)?;
    session.set_filters(filters(view));
    match session.synchronize_view(bbox, view.zoom).await {
        Ok(outcome) => {
            tracing::debug!(%outcome, "viewport synchronized");
            Ok((session, outcome))
        }
        Err(e) => {
            session.shutdown().await;
            Err(e.into())
        }
    }
}
