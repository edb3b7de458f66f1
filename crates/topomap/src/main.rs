mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Offline commands: no backend needed
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Health(args) => commands::health::handle(&args, &cli.global),
        Command::Geometry(args) => commands::geometry::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "topomap", &mut std::io::stdout());
            Ok(())
        }

        // Everything else synchronizes a viewport first
        cmd => {
            let engine = config::build_engine_config(&cli.global)?;
            tracing::debug!(command = ?cmd, backend = %engine.backend, "dispatching command");
            commands::dispatch(cmd, engine, &cli.global).await
        }
    }
}
