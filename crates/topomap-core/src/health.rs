// ── Link health scoring ──
//
// Deterministic 0..=100 score for a link, consumed for edge colouring and
// the health pill in tabular views.

use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::model::{Link, LinkStatus};

/// Score reported for links that carry no traffic at all.
const DEAD_LINK_SCORE: u8 = 5;

/// Coarse classification of a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HealthTone {
    Good,
    Warn,
    Bad,
}

impl HealthTone {
    fn from_score(value: u8) -> Self {
        match value {
            80.. => Self::Good,
            60..=79 => Self::Warn,
            _ => Self::Bad,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkHealth {
    pub value: u8,
    pub tone: HealthTone,
}

/// Score a link from its status and optional metrics.
///
/// Missing metrics contribute no penalty.
pub fn score(link: &Link) -> LinkHealth {
    score_parts(
        link.status,
        link.utilization_pct,
        link.latency_ms,
        link.loss_db,
    )
}

/// Same as [`score`], for callers that only hold the raw attributes.
pub fn score_parts(
    status: LinkStatus,
    utilization_pct: Option<f64>,
    latency_ms: Option<f64>,
    loss_db: Option<f64>,
) -> LinkHealth {
    if matches!(status, LinkStatus::Down | LinkStatus::Retired) {
        return LinkHealth {
            value: DEAD_LINK_SCORE,
            tone: HealthTone::Bad,
        };
    }

    let mut value: i32 = 100;
    value -= status_penalty(status);
    value -= utilization_pct.map_or(0, utilization_penalty);
    value -= latency_ms.map_or(0, latency_penalty);
    value -= loss_db.map_or(0, loss_penalty);

    let value = u8::try_from(value.clamp(0, 100)).unwrap_or(0);
    LinkHealth {
        value,
        tone: HealthTone::from_score(value),
    }
}

fn status_penalty(status: LinkStatus) -> i32 {
    match status {
        LinkStatus::Maintenance => 32,
        LinkStatus::Degraded => 20,
        LinkStatus::Inactive => 12,
        LinkStatus::Planning => 10,
        LinkStatus::Up | LinkStatus::Down | LinkStatus::Retired => 0,
    }
}

fn utilization_penalty(pct: f64) -> i32 {
    if pct >= 90.0 {
        40
    } else if pct >= 75.0 {
        20
    } else if pct >= 60.0 {
        10
    } else {
        0
    }
}

fn latency_penalty(ms: f64) -> i32 {
    if ms > 40.0 {
        15
    } else if ms > 20.0 {
        8
    } else {
        0
    }
}

fn loss_penalty(db: f64) -> i32 {
    if db > 3.0 {
        25
    } else if db > 1.0 {
        12
    } else if db > 0.3 {
        6
    } else {
        0
    }
}
