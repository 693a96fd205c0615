//! # doodle
//!
//! Terminal front end for the Doodle round synchronization core.
//!
//! ## Commands
//!
//! - `play`: Run a round loop driven by lines on stdin
//! - `score`: Show or clear the persisted session score
//! - `replay`: Rebuild a canvas from a recorded frame log
//!
//! ## Example
//!
//! ```bash
//! # Play, recording every replicated frame
//! doodle play --record strokes.log
//!
//! # Rebuild the drawing from the recording
//! doodle replay strokes.log --ppm drawing.ppm
//!
//! # Check the score
//! doodle score show
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod framelog;

use commands::{play, replay, score};

/// Terminal front end for Doodle rounds.
#[derive(Parser, Debug)]
#[command(name = "doodle")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the score file and default config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to doodle.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play rounds, reading commands and guesses from stdin
    Play {
        /// Default round length in seconds
        #[arg(long, short)]
        duration: Option<u32>,

        /// Seed for word selection
        #[arg(long)]
        seed: Option<u64>,

        /// Name guesses are submitted under
        #[arg(long, short, default_value = "player")]
        player: String,

        /// Write every replicated frame to this file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Inspect the persisted session score
    Score {
        #[command(subcommand)]
        action: ScoreAction,
    },

    /// Rebuild a canvas from a recorded frame log
    Replay {
        /// Frame log written by `play --record`
        file: PathBuf,

        /// Write the rebuilt canvas as a PPM image
        #[arg(long)]
        ppm: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ScoreAction {
    /// Print the stored score
    Show,
    /// Reset the stored score
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let game_config = config::load(cli.config.as_deref(), &data_dir)?;

    match cli.command {
        Commands::Play {
            duration,
            seed,
            player,
            record,
        } => {
            let options = play::PlayOptions {
                duration,
                seed,
                player,
                record,
            };
            play::run(&data_dir, &game_config, options).await?;
        }
        Commands::Score { action } => match action {
            ScoreAction::Show => score::show(&data_dir, &game_config).await?,
            ScoreAction::Clear => score::clear(&data_dir, &game_config).await?,
        },
        Commands::Replay { file, ppm } => {
            replay::run(&game_config, &file, ppm.as_deref()).await?;
        }
    }

    Ok(())
}

/// Get the default data directory for doodle.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "doodle", "doodle")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
