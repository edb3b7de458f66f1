//! Config subcommand handlers.

use topomap_config::{Profile, save_config_to};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_file(global);

    match args.command {
        ConfigCommand::Init {
            name,
            url,
            token_env,
            set_default,
        } => {
            let mut cfg = config::load(global)?;
            let profile = Profile {
                backend: url,
                api_token_env: token_env,
                ..Profile::default()
            };
            // Fail before writing anything the engine would reject.
            topomap_config::profile_to_engine_config(&profile, &cfg.defaults)?;

            let first = cfg.profiles.is_empty();
            cfg.profiles.insert(name.clone(), profile);
            if set_default || first {
                cfg.default_profile = Some(name.clone());
            }
            save_config_to(&cfg, &path)?;

            if !global.quiet {
                eprintln!("Profile '{name}' saved to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let mut cfg = config::load(global)?;
            for profile in cfg.profiles.values_mut() {
                if profile.api_token.is_some() {
                    profile.api_token = Some(REDACTED.into());
                }
            }
            let out = match global.output {
                OutputFormat::Json => serde_json::to_string_pretty(&cfg)?,
                OutputFormat::JsonCompact => serde_json::to_string(&cfg)?,
                OutputFormat::Yaml => serde_yaml::to_string(&cfg)?,
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load(global)?;
            let default = cfg.default_profile.as_deref();
            let lines: Vec<String> = cfg
                .profiles
                .iter()
                .map(|(name, p)| {
                    let marker = if Some(name.as_str()) == default { "*" } else { " " };
                    format!("{marker} {name}\t{}", p.backend)
                })
                .collect();
            output::print_output(&lines.join("\n"), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load(global)?;
            // Validates the name and reports what exists.
            cfg.profile(Some(name.as_str()))?;
            cfg.default_profile = Some(name.clone());
            save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
