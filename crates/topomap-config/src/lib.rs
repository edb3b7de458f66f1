//! Shared configuration for the topomap CLI.
//!
//! TOML profiles, API token resolution (env var + plaintext), and
//! translation to `topomap_core::EngineConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use topomap_core::EngineConfig;

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `TOPOMAP_DEFAULTS__TIMEOUT=5`.
pub const ENV_PREFIX: &str = "TOPOMAP_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found (available: {available})")]
    UnknownProfile { profile: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
                available: if self.profiles.is_empty() {
                    "none".into()
                } else {
                    self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
                },
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile. Unset tuning fields take the engine defaults.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://noc.example.net").
    pub backend: String,

    /// API token (plaintext; prefer `api_token_env`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Environment variable name containing the API token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token_env: Option<String>,

    /// Override the request timeout, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_capacity: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_span_deg: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "topomap", "topomap").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("topomap");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the API token: the env var the profile names, then the
/// plaintext value. `None` means the backend is used unauthenticated.
pub fn resolve_api_token(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.api_token_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Some(SecretString::from(val));
            }
        }
    }
    profile.api_token.clone().map(SecretString::from)
}

// ── Translation to the engine config ────────────────────────────────

/// Build an `EngineConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_engine_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<EngineConfig, ConfigError> {
    let url: url::Url = profile
        .backend
        .parse()
        .map_err(|_| invalid("backend", format!("invalid URL: {}", profile.backend)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "backend",
            format!("expected an http(s) URL, got '{}'", url.scheme()),
        ));
    }

    let mut cfg = EngineConfig::new(url);
    cfg.api_token = resolve_api_token(profile);
    cfg.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    if let Some(ms) = profile.debounce_ms {
        cfg.debounce = Duration::from_millis(ms);
    }
    if let Some(secs) = profile.cache_ttl_secs {
        cfg.cache_ttl = Duration::from_secs(secs);
    }
    if let Some(capacity) = profile.cache_capacity {
        if capacity == 0 {
            return Err(invalid("cache_capacity", "must be at least 1"));
        }
        cfg.cache_capacity = capacity;
    }
    if let Some(span) = profile.min_span_deg {
        if !(span.is_finite() && span > 0.0) {
            return Err(invalid(
                "min_span_deg",
                format!("must be a positive number of degrees, got {span}"),
            ));
        }
        cfg.min_span_deg = span;
    }
    if let Some(size) = profile.page_size {
        if size == 0 {
            return Err(invalid("page_size", "must be at least 1"));
        }
        cfg.page_size = size;
    }

    Ok(cfg)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
timeout = 12

[profiles.lab]
backend = "https://noc.lab.example"
api_token = "plain-token"
debounce_ms = 150
cache_capacity = 8

[profiles.prod]
backend = "https://noc.example.net"
api_token_env = "TOPOMAP_PROD_TOKEN"
"#;

    fn profile(backend: &str) -> Profile {
        Profile {
            backend: backend.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn loads_profiles_from_file() {
        // Inside a jail so concurrent env overrides cannot leak in.
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.defaults.timeout, 12);
            assert_eq!(cfg.defaults.output, "table");

            let (name, lab) = cfg.profile(None).map_err(|e| e.to_string())?;
            assert_eq!(name, "lab");
            assert_eq!(lab.debounce_ms, Some(150));
            assert!(cfg.profile(Some("prod")).is_ok());
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn unknown_profile_lists_available() {
        let mut cfg = Config::default();
        cfg.profiles.insert("lab".into(), profile("https://a.example"));
        cfg.profiles.insert("prod".into(), profile("https://b.example"));

        let err = cfg.profile(Some("staging")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "profile 'staging' not found (available: lab, prod)"
        );
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                page_size: Some(250),
                ..profile("https://noc.example.net")
            },
        );

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        let (_, p) = loaded.profile(None).unwrap();
        assert_eq!(p.backend, "https://noc.example.net");
        assert_eq!(p.page_size, Some(250));
        assert_eq!(p.api_token, None);
    }

    #[test]
    fn env_overrides_file_values() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("TOPOMAP_DEFAULTS__TIMEOUT", "5");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.defaults.timeout, 5);
            Ok(())
        });
    }

    #[test]
    fn token_env_var_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("TOPOMAP_TEST_TOKEN", "from-env");
            let p = Profile {
                api_token: Some("plain".into()),
                api_token_env: Some("TOPOMAP_TEST_TOKEN".into()),
                ..profile("https://noc.example.net")
            };
            let token = resolve_api_token(&p).unwrap();
            assert_eq!(token.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn token_falls_back_to_plaintext() {
        let p = Profile {
            api_token: Some("plain".into()),
            api_token_env: Some("TOPOMAP_SURELY_UNSET_TOKEN_VAR".into()),
            ..profile("https://noc.example.net")
        };
        assert_eq!(resolve_api_token(&p).unwrap().expose_secret(), "plain");
        assert!(resolve_api_token(&profile("https://noc.example.net")).is_none());
    }

    #[test]
    fn profile_overrides_engine_defaults() {
        let p = Profile {
            debounce_ms: Some(100),
            cache_ttl_secs: Some(5),
            min_span_deg: Some(0.001),
            ..profile("https://noc.example.net")
        };
        let defaults = Defaults {
            timeout: 9,
            ..Defaults::default()
        };

        let cfg = profile_to_engine_config(&p, &defaults).unwrap();
        assert_eq!(cfg.backend.as_str(), "https://noc.example.net/");
        assert_eq!(cfg.timeout, Duration::from_secs(9));
        assert_eq!(cfg.debounce, Duration::from_millis(100));
        assert_eq!(cfg.cache_ttl, Duration::from_secs(5));
        assert_eq!(cfg.cache_capacity, topomap_core::config::DEFAULT_CACHE_CAPACITY);
        assert!((cfg.min_span_deg - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn validation_names_the_field() {
        let defaults = Defaults::default();
        let cases = [
            (profile("not a url"), "backend"),
            (profile("ftp://noc.example.net"), "backend"),
            (
                Profile {
                    cache_capacity: Some(0),
                    ..profile("https://noc.example.net")
                },
                "cache_capacity",
            ),
            (
                Profile {
                    min_span_deg: Some(-1.0),
                    ..profile("https://noc.example.net")
                },
                "min_span_deg",
            ),
            (
                Profile {
                    page_size: Some(0),
                    ..profile("https://noc.example.net")
                },
                "page_size",
            ),
        ];

        for (p, expected) in cases {
            match profile_to_engine_config(&p, &defaults) {
                Err(ConfigError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected a validation error on {expected}, got {other:?}"),
            }
        }
    }
}
