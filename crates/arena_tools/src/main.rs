//! Lane Arena - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "arena-tools")]
#[command(about = "Development tools for Lane Arena")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "crates/arena_core/data")]
        path: PathBuf,
    },
    /// Write the built-in tables and default rules as editable RON
    Defaults {
        /// Directory to write into
        path: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            match arena_tools::validate::validate_data_directory(&path) {
                Ok(report) => tracing::info!(
                    units = report.units,
                    cards = report.cards,
                    rules = report.has_config,
                    "Validation passed"
                ),
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Defaults { path } => {
            if let Err(e) = arena_tools::validate::write_defaults(&path) {
                tracing::error!("{e}");
                std::process::exit(1);
            }
            tracing::info!("Wrote default data to {}", path.display());
        }
    }
}
