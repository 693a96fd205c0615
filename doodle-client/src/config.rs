//! Configuration loading for the Doodle coordinator.
//!
//! Configuration is loaded from a TOML file (default: `doodle.toml`). Every
//! field has a default, so an empty file or a missing section is valid.

use doodle_core::{RoundLimits, Thresholds, MAX_ROUND_SECS, MIN_ROUND_SECS};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Round length and scoring.
    #[serde(default)]
    pub round: RoundConfig,
    /// Countdown polling and thresholds.
    #[serde(default)]
    pub timer: TimerConfig,
    /// Drawing surface size.
    #[serde(default)]
    pub canvas: CanvasConfig,
    /// Stroke replication and event feed buffering.
    #[serde(default)]
    pub replication: ReplicationConfig,
    /// Score persistence.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Round configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RoundConfig {
    /// Length used when a start request names none (default: 60).
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u32,
    /// Shortest accepted round (default: 30).
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: u32,
    /// Longest accepted round (default: 300).
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u32,
    /// Points for the first correct guess (default: 10).
    #[serde(default = "default_points_per_solve")]
    pub points_per_solve: u32,
    /// Give up on the word source after this long (default: 5000).
    #[serde(default = "default_word_timeout_ms")]
    pub word_timeout_ms: u64,
}

/// Timer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TimerConfig {
    /// How often the coordinator observes the countdown (default: 100).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Seconds left at which the one-shot warning fires (default: 10).
    #[serde(default = "default_warning_threshold_secs")]
    pub warning_threshold_secs: u32,
    /// Upper bound of the caution band (default: 30).
    #[serde(default = "default_caution_threshold_secs")]
    pub caution_threshold_secs: u32,
}

/// Canvas configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    /// Surface width in pixels (default: 800).
    #[serde(default = "default_canvas_width")]
    pub width: u32,
    /// Surface height in pixels (default: 600).
    #[serde(default = "default_canvas_height")]
    pub height: u32,
}

/// Replication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicationConfig {
    /// Early frames held before a gap is skipped (default: 64).
    #[serde(default = "default_reorder_window")]
    pub reorder_window: usize,
    /// Events buffered per round event subscriber (default: 256).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Score file path. Unset means the platform data directory.
    pub score_path: Option<PathBuf>,
}

// Default value functions
fn default_duration_secs() -> u32 {
    60
}

fn default_min_duration_secs() -> u32 {
    MIN_ROUND_SECS
}

fn default_max_duration_secs() -> u32 {
    MAX_ROUND_SECS
}

fn default_points_per_solve() -> u32 {
    10
}

fn default_word_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_warning_threshold_secs() -> u32 {
    10
}

fn default_caution_threshold_secs() -> u32 {
    30
}

fn default_canvas_width() -> u32 {
    doodle_core::DEFAULT_WIDTH
}

fn default_canvas_height() -> u32 {
    doodle_core::DEFAULT_HEIGHT
}

fn default_reorder_window() -> usize {
    doodle_core::DEFAULT_REORDER_WINDOW
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_duration_secs(),
            min_duration_secs: default_min_duration_secs(),
            max_duration_secs: default_max_duration_secs(),
            points_per_solve: default_points_per_solve(),
            word_timeout_ms: default_word_timeout_ms(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            warning_threshold_secs: default_warning_threshold_secs(),
            caution_threshold_secs: default_caution_threshold_secs(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_width(),
            height: default_canvas_height(),
        }
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            reorder_window: default_reorder_window(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round: RoundConfig::default(),
            timer: TimerConfig::default(),
            canvas: CanvasConfig::default(),
            replication: ReplicationConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load and validate configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// values are inconsistent.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let round = &self.round;
        if round.min_duration_secs < MIN_ROUND_SECS || round.max_duration_secs > MAX_ROUND_SECS {
            return Err(ConfigError::Invalid(format!(
                "round duration range {}..={} is outside {}..={}",
                round.min_duration_secs, round.max_duration_secs, MIN_ROUND_SECS, MAX_ROUND_SECS
            )));
        }
        if round.min_duration_secs > round.max_duration_secs {
            return Err(ConfigError::Invalid(format!(
                "round duration range {}..={} is empty",
                round.min_duration_secs, round.max_duration_secs
            )));
        }
        if round.default_duration_secs < round.min_duration_secs
            || round.default_duration_secs > round.max_duration_secs
        {
            return Err(ConfigError::Invalid(format!(
                "default round duration {}s is outside {}..={}",
                round.default_duration_secs, round.min_duration_secs, round.max_duration_secs
            )));
        }
        if self.timer.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll interval must be non-zero".into()));
        }
        let timer = &self.timer;
        if timer.warning_threshold_secs == 0
            || timer.warning_threshold_secs > timer.caution_threshold_secs
        {
            return Err(ConfigError::Invalid(format!(
                "warning threshold {}s must be non-zero and at most the caution threshold {}s",
                timer.warning_threshold_secs, timer.caution_threshold_secs
            )));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas size {}x{} has no pixels",
                self.canvas.width, self.canvas.height
            )));
        }
        if self.replication.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event channel capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Round limits for the state machine.
    pub fn limits(&self) -> RoundLimits {
        RoundLimits {
            min_duration_secs: self.round.min_duration_secs,
            max_duration_secs: self.round.max_duration_secs,
            points_per_solve: self.round.points_per_solve,
        }
    }

    /// Countdown thresholds for the timer.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            warning_secs: self.timer.warning_threshold_secs,
            caution_secs: self.timer.caution_threshold_secs,
        }
    }

    /// Timer poll period.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.timer.poll_interval_ms)
    }

    /// Word source deadline.
    pub fn word_timeout(&self) -> Duration {
        Duration::from_millis(self.round.word_timeout_ms)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Values parsed but are inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
