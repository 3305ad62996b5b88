//! dpp CLI: the `dpp` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Diagnostics go to stderr; stdout carries documents only.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "dpp=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            source,
            input,
            out,
            heuristics,
            json,
        } => commands::classify::run(commands::classify::Args {
            source,
            input,
            out,
            heuristics,
            json,
        }),

        Commands::Schemas { config_dir, json } => commands::schemas::run(config_dir, json),

        Commands::Export {
            schema,
            passport,
            config_dir,
            check,
        } => commands::export::run(schema, passport, config_dir, check),

        Commands::Ingest {
            schema,
            input,
            table,
            config_dir,
        } => commands::ingest::run(schema, input, table, config_dir),

        Commands::Validate {
            schema,
            input,
            json,
        } => commands::validate::run(schema, input, json),

        Commands::Sample { schema } => commands::sample::run(schema),
    }
}
