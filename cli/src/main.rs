//! Walkthrough CLI - play and check scenario manifests
//!
//! # Commands
//! - `walkthrough check <manifest>` - Validate a JSON or TOML manifest
//! - `walkthrough play <manifest>` - Step through a manifest in the terminal

mod check;
mod play;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Walkthrough scenario player
#[derive(Parser)]
#[command(name = "walkthrough")]
#[command(author, version, about = "Play step-by-step system scenarios in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario manifest
    Check {
        /// Manifest file (.json or .toml)
        manifest: PathBuf,
    },

    /// Play a scenario manifest
    Play {
        /// Manifest file (.json or .toml)
        manifest: PathBuf,

        /// Playback speed multiplier (overrides config and WALKTHROUGH_SPEED)
        #[arg(short, long)]
        speed: Option<f64>,

        /// Auto-play to completion instead of reading commands from stdin
        #[arg(long)]
        auto: bool,

        /// Engine config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { manifest } => check::run_check_command(&manifest),
        Commands::Play {
            manifest,
            speed,
            auto,
            config,
        } => {
            play::run_play_command(play::PlayOptions {
                manifest,
                speed,
                auto,
                config,
            })
            .await
        }
    }
}
