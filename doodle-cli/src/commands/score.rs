//! Show or reset the persisted session score.

use anyhow::{Context, Result};
use doodle_client::{FileScoreStore, GameConfig, ScoreStore};
use std::path::Path;

use crate::config;

/// Print the stored score.
pub async fn show(data_dir: &Path, game_config: &GameConfig) -> Result<()> {
    let store = FileScoreStore::new(config::score_path(game_config, data_dir));
    let score = store.load().await.context("Failed to load score")?;
    println!("Score: {}", score);
    println!("  File: {}", store.path().display());
    Ok(())
}

/// Reset the stored score.
pub async fn clear(data_dir: &Path, game_config: &GameConfig) -> Result<()> {
    let store = FileScoreStore::new(config::score_path(game_config, data_dir));
    store.clear().await.context("Failed to clear score")?;
    println!("Score cleared.");
    Ok(())
}
