// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Transform {
            config,
            output,
            cache,
            view,
            jars,
        } => commands::cmd_transform(config.as_deref(), &output, cache.as_deref(), &view, &jars),
        Commands::Infer { ids, extension } => commands::cmd_infer(&ids, &extension),
        Commands::Inspect { jar, json } => commands::cmd_inspect(&jar, json),
        Commands::CheckConfig { config } => commands::cmd_check_config(&config),
    }
}
