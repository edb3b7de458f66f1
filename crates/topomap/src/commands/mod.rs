//! Command dispatch: bridges CLI args -> engine session -> output formatting.

pub mod config_cmd;
pub mod geometry;
pub mod health;
pub mod links;
pub mod nodes;
pub mod sync;
pub mod util;
pub mod zones;

use topomap_core::EngineConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    engine: EngineConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Sync(view) => sync::handle(engine, &view, global).await,
        Command::Nodes(args) => nodes::handle(engine, args, global).await,
        Command::Links(args) => links::handle(engine, args, global).await,
        Command::Zones(args) => zones::handle(engine, args, global).await,
        Command::Config(_)
        | Command::Health(_)
        | Command::Geometry(_)
        | Command::Completions(_) => Err(CliError::Internal(
            "offline command routed to the backend dispatcher".into(),
        )),
    }
}
