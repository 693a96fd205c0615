//! Configuration and file locations for the doodle CLI.

use anyhow::{Context, Result};
use doodle_client::GameConfig;
use std::path::{Path, PathBuf};

/// Config file looked up in the data directory when `--config` is absent.
pub const CONFIG_FILE: &str = "doodle.toml";

/// Score file name inside the data directory.
pub const SCORE_FILE: &str = "score.json";

/// Load the game configuration.
///
/// An explicit path must exist. Without one, `doodle.toml` in the data
/// directory is used if present, and the built-in defaults otherwise.
pub fn load(explicit: Option<&Path>, data_dir: &Path) -> Result<GameConfig> {
    if let Some(path) = explicit {
        return GameConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let implicit = data_dir.join(CONFIG_FILE);
    if implicit.exists() {
        return GameConfig::from_file(&implicit)
            .with_context(|| format!("Failed to load config {}", implicit.display()));
    }

    Ok(GameConfig::default())
}

/// Where the session score lives.
pub fn score_path(config: &GameConfig, data_dir: &Path) -> PathBuf {
    config
        .storage
        .score_path
        .clone()
        .unwrap_or_else(|| data_dir.join(SCORE_FILE))
}
