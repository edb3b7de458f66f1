// ── Viewport tracking ──
//
// Turns raw view-extent events into normalized bounding boxes and
// coalesces bursts of movement into a single downstream notification.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::geometry::Coordinate;

/// A geographic extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bbox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        (self.west..=self.east).contains(&c.lng) && (self.south..=self.north).contains(&c.lat)
    }

    /// Order the edges and widen any axis narrower than `min_span` around
    /// its midpoint.
    pub fn normalized(self, min_span: f64) -> Self {
        let (west, east) = ordered(self.west, self.east);
        let (south, north) = ordered(self.south, self.north);
        let (west, east) = widen(west, east, min_span);
        let (south, north) = widen(south, north, min_span);
        Self {
            west,
            south,
            east,
            north,
        }
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

fn widen(lo: f64, hi: f64, min_span: f64) -> (f64, f64) {
    if hi - lo >= min_span {
        return (lo, hi);
    }
    let mid = (lo + hi) / 2.0;
    let lo = mid - min_span / 2.0;
    let mut hi = lo + min_span;
    // Rounding can leave the span a few ulps short.
    while hi - lo < min_span {
        hi = hi.next_up();
    }
    (lo, hi)
}

/// `west,south,east,north` with six decimals, the form the backend expects.
impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6},{:.6},{:.6},{:.6}",
            self.west, self.south, self.east, self.north
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected `west,south,east,north` in degrees, got {0:?}")]
pub struct BboxParseError(pub String);

impl FromStr for Bbox {
    type Err = BboxParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| BboxParseError(s.to_owned()))?;
        match parts.as_slice() {
            &[west, south, east, north] if parts.iter().all(|v| v.is_finite()) => {
                Ok(Self::new(west, south, east, north))
            }
            _ => Err(BboxParseError(s.to_owned())),
        }
    }
}

/// A settled view: normalized extent plus zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportChange {
    pub bbox: Bbox,
    pub zoom: f64,
}

impl ViewportChange {
    /// Zoom rounded to a whole level, so sub-level pinches share cache entries.
    pub fn zoom_signature(&self) -> String {
        format!("{:.0}", self.zoom)
    }
}

// ── ViewportTracker ──────────────────────────────────────────────

/// Receives every view-movement event and emits one [`ViewportChange`]
/// per pause in movement.
pub struct ViewportTracker {
    min_span: f64,
    events: mpsc::UnboundedSender<ViewportChange>,
    last: watch::Sender<Option<ViewportChange>>,
}

impl ViewportTracker {
    /// Spawn the debounce task. Settled changes arrive on the returned
    /// receiver `delay` after the last movement.
    pub fn spawn(
        delay: Duration,
        min_span: f64,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<ViewportChange>, JoinHandle<()>) {
        let (events, raw_rx) = mpsc::unbounded_channel();
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let (last, _) = watch::channel(None);

        let handle = tokio::spawn(debounce_task(raw_rx, settled_tx, delay, cancel));

        (
            Self {
                min_span,
                events,
                last,
            },
            settled_rx,
            handle,
        )
    }

    /// Record a movement. Returns the normalized change that will be
    /// emitted if no further movement follows.
    pub fn on_view_changed(&self, bbox: Bbox, zoom: f64) -> ViewportChange {
        let change = self.record(bbox, zoom);
        if self.events.send(change).is_err() {
            debug!("viewport debounce task has stopped; dropping movement");
        }
        change
    }

    /// Record a view as current without queuing it for the debounce.
    pub fn record(&self, bbox: Bbox, zoom: f64) -> ViewportChange {
        let change = ViewportChange {
            bbox: bbox.normalized(self.min_span),
            zoom,
        };
        self.last.send_replace(Some(change));
        change
    }

    /// Most recent movement, settled or not.
    pub fn last(&self) -> Option<ViewportChange> {
        *self.last.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ViewportChange>> {
        self.last.subscribe()
    }
}

async fn debounce_task(
    mut raw: mpsc::UnboundedReceiver<ViewportChange>,
    settled: mpsc::UnboundedSender<ViewportChange>,
    delay: Duration,
    cancel: CancellationToken,
) {
    loop {
        let mut pending = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            event = raw.recv() => match event {
                Some(change) => change,
                None => return,
            },
        };

        // Each new event restarts the quiet-period timer.
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                event = raw.recv() => match event {
                    Some(change) => pending = change,
                    None => {
                        let _ = settled.send(pending);
                        return;
                    }
                },
                () = tokio::time::sleep(delay) => {
                    debug!(bbox = %pending.bbox, zoom = pending.zoom, "viewport settled");
                    if settled.send(pending).is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}
