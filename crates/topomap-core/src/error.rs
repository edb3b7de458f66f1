// ── Core error types ──
//
// User-facing errors from topomap-core. Consumers never see raw HTTP
// failures; the `From<topomap_api::Error>` impl translates them.

use thiserror::Error;

use crate::geometry::GeometryParseError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Backend returned an unusable {entity_type} record {identifier}: {reason}")]
    InvalidRecord {
        entity_type: &'static str,
        identifier: String,
        reason: String,
    },

    // ── Validation errors ────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryParseError),

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Backend error: {message}")]
    Api { message: String, status: Option<u16> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    /// Network failures a later synchronization may not hit again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout => true,
            Self::Api { status, .. } => status.is_none_or(|s| s == 429 || s >= 500),
            _ => false,
        }
    }

    /// Local validation failures that keep the user in the same form step.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationFailed { .. } | Self::Geometry(_))
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<topomap_api::Error> for CoreError {
    fn from(err: topomap_api::Error) -> Self {
        match err {
            topomap_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        entity_type: "Resource".into(),
                        identifier: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            topomap_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            topomap_api::Error::InvalidToken(reason) => CoreError::Config {
                message: format!("Invalid API token: {reason}"),
            },
            topomap_api::Error::Api { message, status: 404 } => CoreError::NotFound {
                entity_type: "Resource".into(),
                identifier: message,
            },
            topomap_api::Error::Api { message, status } => CoreError::Api {
                message,
                status: Some(status),
            },
            topomap_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
