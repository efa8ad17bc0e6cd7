//! tyrefacts CLI - tyre retail sales ETL.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = ctrlc::set_handler(|| {
        eprintln!("\nInterrupted");
        std::process::exit(130);
    }) {
        tracing::warn!(error = %e, "could not install interrupt handler");
    }

    let result = match cli.command {
        Commands::Run {
            config,
            no_export,
            no_validation_report,
            json,
        } => commands::run::run(config, no_export, no_validation_report, json, cli.verbose),

        Commands::Configs { dir } => commands::configs::run(dir, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
