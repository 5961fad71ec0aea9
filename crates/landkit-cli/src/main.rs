use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use landkit_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "landkit")]
#[command(author, version, about = "Replay and inspect landing page interactions headlessly")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/landkit/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an interaction script against a page fixture
    Replay {
        /// Page fixture (.toml or .json)
        #[arg(short = 'f', long)]
        fixture: PathBuf,
        /// Interaction script (.toml or .json)
        #[arg(short = 's', long)]
        script: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the components a fixture would activate
    Inspect {
        /// Page fixture (.toml or .json)
        #[arg(short = 'f', long)]
        fixture: PathBuf,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Replay {
            fixture,
            script,
            json,
        } => commands::replay::run(config, &fixture, &script, json).await,
        Commands::Inspect { fixture } => commands::inspect::run(config, &fixture),
        Commands::Config => commands::config::run(&config),
    }
}
