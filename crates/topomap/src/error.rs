//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `DrawError` and `ConfigError` into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use topomap_config::ConfigError;
use topomap_core::{CoreError, DrawError, GeometryParseError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to backend at {url}: {reason}")]
    #[diagnostic(
        code(topomap::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(topomap::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(topomap::not_found),
        help("Run: topomap {list_command} --bbox <W,S,E,N> to see what the viewport holds")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Nodes are already connected by link \"{name}\" ({existing})")]
    #[diagnostic(
        code(topomap::conflict),
        help("Edit the existing link instead of drawing a second one.")
    )]
    DuplicateLink { existing: String, name: String },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Backend error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(topomap::api_error))]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(topomap::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid geometry: {0}")]
    #[diagnostic(
        code(topomap::geometry),
        help("Expected GeoJSON with [lng, lat] positions, e.g. {{\"type\":\"LineString\",\"coordinates\":[[0,0],[1,1]]}}")
    )]
    Geometry(#[from] GeometryParseError),

    #[error("{0}")]
    #[diagnostic(code(topomap::drawing))]
    Drawing(DrawError),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(topomap::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: topomap config init --url <URL>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(topomap::no_config),
        help(
            "Create a profile with: topomap config init --url <URL>\n\
             Or pass --backend / set TOPOMAP_BACKEND.\n\
             Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(topomap::config))]
    Config(ConfigError),

    #[error("Internal error: {0}")]
    #[diagnostic(code(topomap::internal))]
    Internal(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(topomap::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(topomap::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML serialization failed: {0}")]
    #[diagnostic(code(topomap::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::DuplicateLink { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::Geometry(_) | Self::Drawing(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::Timeout => Self::Timeout,

            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                list_command: format!("{}s list", entity_type.to_lowercase()),
                resource_type: entity_type,
                identifier,
            },

            CoreError::InvalidRecord {
                entity_type,
                identifier,
                reason,
            } => Self::Api {
                message: format!("malformed {entity_type} record '{identifier}': {reason}"),
                status: None,
            },

            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Geometry(e) => Self::Geometry(e),

            CoreError::Api { message, status } => Self::Api { message, status },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<DrawError> for CliError {
    fn from(err: DrawError) -> Self {
        match err {
            DrawError::DuplicateLink { existing, name } => Self::DuplicateLink {
                existing: existing.to_string(),
                name,
            },
            DrawError::UnknownNode(id) => Self::NotFound {
                resource_type: "Node".into(),
                identifier: id.to_string(),
                list_command: "nodes list".into(),
            },
            DrawError::Geometry(e) => Self::Geometry(e),
            other => Self::Drawing(other),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { profile, available } => Self::ProfileNotFound {
                name: profile,
                available,
            },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topomap_core::EntityId;

    #[test]
    fn exit_codes_follow_error_class() {
        let not_found: CliError = CoreError::NotFound {
            entity_type: "Link".into(),
            identifier: "l9".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);
        assert!(matches!(
            &not_found,
            CliError::NotFound { list_command, .. } if list_command == "links list"
        ));

        let dup: CliError = DrawError::DuplicateLink {
            existing: EntityId::from("l1"),
            name: "A-B".into(),
        }
        .into();
        assert_eq!(dup.exit_code(), exit_code::CONFLICT);

        let invalid: CliError = CoreError::ValidationFailed {
            message: "priority must be a positive integer".into(),
        }
        .into();
        assert_eq!(invalid.exit_code(), exit_code::USAGE);

        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
        assert_eq!(
            CliError::from(DrawError::SelfLoop).exit_code(),
            exit_code::USAGE
        );
    }

    #[test]
    fn api_status_is_shown_when_known() {
        let err = CliError::Api {
            message: "write rejected".into(),
            status: Some(500),
        };
        assert_eq!(err.to_string(), "Backend error (500): write rejected");
        let err = CliError::Api {
            message: "boom".into(),
            status: None,
        };
        assert_eq!(err.to_string(), "Backend error: boom");
    }
}
