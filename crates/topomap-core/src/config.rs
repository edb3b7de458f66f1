// ── Runtime engine configuration ──
//
// Describes where the backend lives and how the sync engine is tuned.
// Core never reads config files; the CLI builds an `EngineConfig` and
// hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(280);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(20);
pub const DEFAULT_CACHE_CAPACITY: usize = 40;
pub const DEFAULT_MIN_SPAN_DEG: f64 = 0.0002;
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Backend base URL (e.g. `https://noc.example.net`).
    pub backend: Url,
    /// Bearer token, if the backend requires one.
    pub api_token: Option<SecretString>,
    pub timeout: Duration,
    /// Quiet period after the last view movement before syncing.
    pub debounce: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    /// Minimum bbox width and height in degrees.
    pub min_span_deg: f64,
    /// Size of the single page requested per entity kind.
    pub page_size: u32,
}

impl EngineConfig {
    pub fn new(backend: Url) -> Self {
        Self {
            backend,
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
            debounce: DEFAULT_DEBOUNCE,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            min_span_deg: DEFAULT_MIN_SPAN_DEG,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.cache_capacity == 0 {
            return Err(CoreError::Config {
                message: "cache capacity must be at least 1".into(),
            });
        }
        if !(self.min_span_deg.is_finite() && self.min_span_deg > 0.0) {
            return Err(CoreError::Config {
                message: format!("minimum bbox span must be positive, got {}", self.min_span_deg),
            });
        }
        if self.page_size == 0 {
            return Err(CoreError::Config {
                message: "page size must be at least 1".into(),
            });
        }
        Ok(())
    }
}
