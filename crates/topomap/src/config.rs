//! CLI-aware wrappers over `topomap-config`: `--config`, `--profile`,
//! `--backend`, `--api-token` and `--timeout` take precedence over the
//! file.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use topomap_config::{Config, ConfigError, Profile};
use topomap_core::EngineConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file in effect: `--config`, else the platform path.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(topomap_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(topomap_config::load_config_from(&config_file(global))?)
}

/// Build the engine config from the active profile plus flag overrides.
///
/// With no matching profile, `--backend` alone is enough.
pub fn build_engine_config(global: &GlobalOpts) -> Result<EngineConfig, CliError> {
    let cfg = load(global)?;

    let mut engine = match cfg.profile(global.profile.as_deref()) {
        Ok((name, profile)) => {
            tracing::debug!(profile = name, "using profile");
            topomap_config::profile_to_engine_config(profile, &cfg.defaults)?
        }
        Err(ConfigError::UnknownProfile { profile, available }) => {
            let Some(backend) = global.backend.clone() else {
                return Err(if global.profile.is_some() {
                    CliError::ProfileNotFound {
                        name: profile,
                        available,
                    }
                } else {
                    CliError::NoConfig {
                        path: config_file(global).display().to_string(),
                    }
                });
            };
            let adhoc = Profile {
                backend,
                ..Profile::default()
            };
            topomap_config::profile_to_engine_config(&adhoc, &cfg.defaults)?
        }
        Err(other) => return Err(other.into()),
    };

    if let Some(ref raw) = global.backend {
        engine.backend = raw.parse().map_err(|_| CliError::Validation {
            field: "backend".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
    }
    if let Some(ref token) = global.api_token {
        engine.api_token = Some(SecretString::from(token.clone()));
    }
    if let Some(secs) = global.timeout {
        engine.timeout = Duration::from_secs(secs);
    }

    Ok(engine)
}
