//! Rebuild a canvas from a recorded frame log.

use anyhow::{Context, Result};
use doodle_client::{GameConfig, Spectator};
use doodle_core::{Disposition, ReplaySurface};
use doodle_types::StrokeFrame;
use std::path::Path;

use crate::framelog;

/// Outcome of replaying a log.
#[derive(Debug)]
pub struct ReplaySummary {
    /// Frames read from the log.
    pub frames: usize,
    /// Canvas events applied to the final round's surface.
    pub applied: u64,
    /// Frames that arrived more than once.
    pub duplicates: usize,
    /// Frames given up on.
    pub skipped: u64,
    /// The rebuilt surface of the last round in the log.
    pub surface: ReplaySurface,
}

/// Feed `frames` to a spectator, following each new round as it appears.
pub fn replay_frames(
    game_config: &GameConfig,
    frames: Vec<StrokeFrame>,
) -> Result<ReplaySummary> {
    let surface = ReplaySurface::new(game_config.canvas.width, game_config.canvas.height)
        .context("Invalid canvas size")?;
    let mut spectator = Spectator::new(surface, game_config.replication.reorder_window);

    let count = frames.len();
    let mut duplicates = 0;
    for frame in frames {
        if spectator.round() != Some(frame.round) {
            spectator.flush();
            tracing::debug!("Following round {}", frame.round);
            spectator.follow(frame.round);
        }
        if spectator.receive(frame) == Disposition::Duplicate {
            duplicates += 1;
        }
    }
    spectator.flush();

    Ok(ReplaySummary {
        frames: count,
        applied: spectator.applied(),
        duplicates,
        skipped: spectator
            .gaps()
            .iter()
            .fold(0u64, |total, gap| total.saturating_add(gap.len())),
        surface: spectator.surface().clone(),
    })
}

/// Run the replay command.
pub async fn run(game_config: &GameConfig, file: &Path, ppm: Option<&Path>) -> Result<()> {
    let frames = framelog::read(file).await?;
    let summary = replay_frames(game_config, frames)?;

    println!("=== doodle replay ===");
    println!("  Frames:     {}", summary.frames);
    println!("  Applied:    {}", summary.applied);
    println!("  Duplicates: {}", summary.duplicates);
    println!("  Skipped:    {}", summary.skipped);
    println!("  checksum {:016x}", summary.surface.checksum());

    if let Some(path) = ppm {
        tokio::fs::write(path, summary.surface.to_ppm())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
