//! Session score persistence.
//!
//! The coordinator loads the score once at startup, saves it after every
//! award and clears it when the players return to the lobby.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Score store errors.
#[derive(Debug, Error)]
pub enum ScoreStoreError {
    /// Reading or writing the backing file failed.
    #[error("score file {path}: {source}")]
    Io {
        /// Path to the score file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The backing file does not hold a score.
    #[error("score file {path} is corrupt: {source}")]
    Corrupt {
        /// Path to the score file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The store rejected the operation.
    #[error("score store unavailable: {0}")]
    Unavailable(String),
}

/// Persists the session score across restarts.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// The stored score, or 0 when nothing is stored.
    async fn load(&self) -> Result<u32, ScoreStoreError>;

    /// Replace the stored score.
    async fn save(&self, score: u32) -> Result<(), ScoreStoreError>;

    /// Forget the stored score.
    async fn clear(&self) -> Result<(), ScoreStoreError>;
}

/// On-disk representation.
#[derive(Debug, Serialize, Deserialize)]
struct ScoreFile {
    score: u32,
}

/// JSON file score store.
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    /// Store the score at `path`. Parent directories are created on save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the score file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ScoreStoreError {
        ScoreStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ScoreStore for FileScoreStore {
    async fn load(&self) -> Result<u32, ScoreStoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(self.io_error(e)),
        };

        let file: ScoreFile =
            serde_json::from_str(&content).map_err(|e| ScoreStoreError::Corrupt {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(file.score)
    }

    async fn save(&self, score: u32) -> Result<(), ScoreStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let content = serde_json::to_string_pretty(&ScoreFile { score }).map_err(|e| {
            ScoreStoreError::Corrupt {
                path: self.path.clone(),
                source: e,
            }
        })?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| self.io_error(e))
    }

    async fn clear(&self) -> Result<(), ScoreStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-memory score store. Clones share the same score.
#[derive(Debug, Default, Clone)]
pub struct MemoryScoreStore {
    inner: Arc<Mutex<MemoryScoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryScoreInner {
    score: Option<u32>,
    saves: usize,
    fail_next_save: Option<String>,
}

impl MemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `score`.
    pub fn with_score(score: u32) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().score = Some(score);
        store
    }

    /// The stored score, `None` when cleared.
    pub fn stored(&self) -> Option<u32> {
        self.inner.lock().unwrap().score
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.inner.lock().unwrap().saves
    }

    /// Cause the next save() to fail with the given error.
    pub fn fail_next_save(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_save = Some(error.to_string());
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn load(&self) -> Result<u32, ScoreStoreError> {
        Ok(self.inner.lock().unwrap().score.unwrap_or(0))
    }

    async fn save(&self, score: u32) -> Result<(), ScoreStoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_save.take() {
            return Err(ScoreStoreError::Unavailable(error));
        }
        inner.score = Some(score);
        inner.saves += 1;
        Ok(())
    }

    async fn clear(&self) -> Result<(), ScoreStoreError> {
        self.inner.lock().unwrap().score = None;
        Ok(())
    }
}
