// ── Link drawing state machine ──
//
// Drives the interactive "draw a link" flow: pick a source node, optionally
// drop bend points on the map, pick a distinct target node. Topology rules
// are checked against the store at the moment the target is clicked; a
// rejected click leaves the user on the same step.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;
use tracing::debug;

use crate::geometry::{self, Coordinate, Geometry, GeometryParseError, LineString};
use crate::model::EntityId;
use crate::store::TopologyStore;

/// How the link path is drawn.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DrawMode {
    /// Source node, target node, straight line.
    #[default]
    Quick,
    /// Source node, any number of bend points, target node.
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum DrawPhase {
    Idle,
    PickingSource,
    PickingTarget,
}

/// Corrective messages for a rejected drawing step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrawError {
    #[error("A link cannot start and end on the same node")]
    SelfLoop,

    #[error("These nodes are already connected by link \"{name}\"")]
    DuplicateLink { existing: EntityId, name: String },

    #[error("Node {0} is not loaded in the current view")]
    UnknownNode(EntityId),

    #[error("Link drawing is not active")]
    NotDrawing,

    #[error(transparent)]
    Geometry(#[from] GeometryParseError),
}

/// A validated draft ready for the create or update form.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedLink {
    pub from_node: EntityId,
    pub to_node: EntityId,
    /// Set when the draft re-routes an existing link.
    pub editing: Option<EntityId>,
    pub geometry: LineString,
    /// `geometry` as GeoJSON text, for the form's geometry field.
    pub geometry_text: String,
}

/// Result of a click that the state machine accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawStep {
    SourcePicked { from_node: EntityId },
    BendAdded { bends: usize },
    Committed(CommittedLink),
    /// The click has no meaning in the current phase or mode.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerRole {
    Source,
    Bend,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DraftMarker {
    pub coordinate: Coordinate,
    pub role: MarkerRole,
}

/// What the map should draw for the in-progress link.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DraftPreview {
    /// Source, bends, then the pointer when it is over the map.
    pub line: Vec<Coordinate>,
    pub markers: Vec<DraftMarker>,
}

#[derive(Debug, Clone, PartialEq)]
enum DrawState {
    Idle,
    PickingSource,
    PickingTarget {
        from_node: EntityId,
        origin: Coordinate,
        bends: Vec<Coordinate>,
    },
}

#[derive(Debug, Clone)]
pub struct LinkDrawing {
    mode: DrawMode,
    state: DrawState,
    editing: Option<EntityId>,
    pointer: Option<Coordinate>,
}

impl Default for LinkDrawing {
    fn default() -> Self {
        Self::new(DrawMode::default())
    }
}

impl LinkDrawing {
    pub fn new(mode: DrawMode) -> Self {
        Self {
            mode,
            state: DrawState::Idle,
            editing: None,
            pointer: None,
        }
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn phase(&self) -> DrawPhase {
        match self.state {
            DrawState::Idle => DrawPhase::Idle,
            DrawState::PickingSource => DrawPhase::PickingSource,
            DrawState::PickingTarget { .. } => DrawPhase::PickingTarget,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != DrawState::Idle
    }

    pub fn editing(&self) -> Option<&EntityId> {
        self.editing.as_ref()
    }

    pub fn source(&self) -> Option<&EntityId> {
        match &self.state {
            DrawState::PickingTarget { from_node, .. } => Some(from_node),
            _ => None,
        }
    }

    pub fn bends(&self) -> &[Coordinate] {
        match &self.state {
            DrawState::PickingTarget { bends, .. } => bends,
            _ => &[],
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Begin drawing a new link, discarding any prior draft.
    pub fn start(&mut self) {
        self.reset();
        self.state = DrawState::PickingSource;
        debug!(mode = %self.mode, "link drawing started");
    }

    /// Begin re-drawing the path of an existing link.
    pub fn start_edit(&mut self, link_id: EntityId) {
        self.start();
        debug!(link = %link_id, "editing link geometry");
        self.editing = Some(link_id);
    }

    /// Switch modes, even mid-draw. Bend points only survive in path mode.
    pub fn set_mode(&mut self, mode: DrawMode) {
        self.mode = mode;
        if mode == DrawMode::Quick {
            if let DrawState::PickingTarget { bends, .. } = &mut self.state {
                bends.clear();
            }
        }
    }

    pub fn on_node_clicked(
        &mut self,
        store: &TopologyStore,
        node_id: &EntityId,
    ) -> Result<DrawStep, DrawError> {
        let node = store
            .node(node_id)
            .ok_or_else(|| DrawError::UnknownNode(node_id.clone()));

        match &self.state {
            DrawState::Idle => Err(DrawError::NotDrawing),
            DrawState::PickingSource => {
                let node = node?;
                self.state = DrawState::PickingTarget {
                    from_node: node.id.clone(),
                    origin: node.coordinate(),
                    bends: Vec::new(),
                };
                Ok(DrawStep::SourcePicked {
                    from_node: node.id.clone(),
                })
            }
            DrawState::PickingTarget {
                from_node,
                origin,
                bends,
            } => {
                let target = node?;
                if &target.id == from_node {
                    return Err(DrawError::SelfLoop);
                }
                if let Some(existing) =
                    store.find_link_between(from_node, &target.id, self.editing.as_ref())
                {
                    return Err(DrawError::DuplicateLink {
                        existing: existing.id.clone(),
                        name: existing.name.clone(),
                    });
                }

                let start = store.node(from_node).map_or(*origin, |n| n.coordinate());
                let mut path = Vec::with_capacity(bends.len() + 2);
                path.push(start);
                if self.mode == DrawMode::Path {
                    path.extend_from_slice(bends);
                }
                path.push(target.coordinate());
                let geometry = LineString::new(path)?;

                let committed = CommittedLink {
                    from_node: from_node.clone(),
                    to_node: target.id.clone(),
                    editing: self.editing.clone(),
                    geometry_text: geometry::to_text(&Geometry::LineString(geometry.clone())),
                    geometry,
                };
                debug!(
                    from = %committed.from_node,
                    to = %committed.to_node,
                    positions = committed.geometry.len(),
                    "link draft committed"
                );
                self.reset();
                Ok(DrawStep::Committed(committed))
            }
        }
    }

    /// A click on empty map. Adds a bend point in path mode.
    pub fn on_map_clicked(&mut self, at: Coordinate) -> DrawStep {
        if self.mode != DrawMode::Path || !at.is_finite() {
            return DrawStep::Ignored;
        }
        match &mut self.state {
            DrawState::PickingTarget { bends, .. } => {
                bends.push(at);
                DrawStep::BendAdded { bends: bends.len() }
            }
            _ => DrawStep::Ignored,
        }
    }

    /// Track the pointer for the rubber-band segment of the preview.
    pub fn on_pointer_moved(&mut self, at: Option<Coordinate>) {
        self.pointer = at.filter(Coordinate::is_finite);
    }

    /// Remove the most recent bend point.
    pub fn undo(&mut self) -> Option<Coordinate> {
        match &mut self.state {
            DrawState::PickingTarget { bends, .. } if self.mode == DrawMode::Path => bends.pop(),
            _ => None,
        }
    }

    /// Abandon the draft. Returns `false` if nothing was in progress.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.reset();
        if was_active {
            debug!("link drawing cancelled");
        }
        was_active
    }

    pub fn preview(&self) -> DraftPreview {
        let DrawState::PickingTarget { origin, bends, .. } = &self.state else {
            return DraftPreview::default();
        };

        let mut markers = vec![DraftMarker {
            coordinate: *origin,
            role: MarkerRole::Source,
        }];
        markers.extend(bends.iter().map(|&coordinate| DraftMarker {
            coordinate,
            role: MarkerRole::Bend,
        }));

        let mut line = Vec::with_capacity(bends.len() + 2);
        line.push(*origin);
        line.extend_from_slice(bends);
        line.extend(self.pointer);

        DraftPreview { line, markers }
    }

    fn reset(&mut self) {
        self.state = DrawState::Idle;
        self.editing = None;
        self.pointer = None;
    }
}
