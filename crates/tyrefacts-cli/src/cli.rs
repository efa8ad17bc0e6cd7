//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tyrefacts: tyre retail sales ETL pipeline
#[derive(Parser)]
#[command(name = "tyrefacts")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline for one configuration file
    Run {
        /// Path to the YAML configuration
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Process and validate without writing any file
        #[arg(long)]
        no_export: bool,

        /// Skip the detailed validation report
        #[arg(long)]
        no_validation_report: bool,

        /// Print the run result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the configuration files in a directory
    Configs {
        /// Directory holding the YAML configurations
        #[arg(short, long, default_value = "config")]
        dir: PathBuf,
    },
}
