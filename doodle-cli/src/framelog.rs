//! Recorded stroke frame logs.
//!
//! A log is a plain concatenation of encoded frames, each prefixed with its
//! length as a big-endian `u32`.

use anyhow::{bail, Context, Result};
use doodle_types::StrokeFrame;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Largest frame accepted when reading a log.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Appends encoded frames to a file.
pub struct FrameLogWriter {
    file: tokio::fs::File,
    frames: u64,
}

impl FrameLogWriter {
    /// Create (or truncate) the log at `path`.
    pub async fn create(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create frame log {}", path.display()))?;
        Ok(Self { file, frames: 0 })
    }

    /// Append one encoded frame.
    pub async fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len()).context("Frame too large")?;
        self.file.write_all(&len.to_be_bytes()).await?;
        self.file.write_all(bytes).await?;
        self.frames += 1;
        Ok(())
    }

    /// Flush and report the number of frames written.
    pub async fn finish(mut self) -> Result<u64> {
        self.file.flush().await?;
        Ok(self.frames)
    }
}

/// Split a log into its encoded frames.
pub fn split(data: &[u8]) -> Result<Vec<&[u8]>> {
    let mut frames = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        if rest.len() < 4 {
            bail!("Truncated frame header at byte {}", data.len() - rest.len());
        }
        let (header, body) = rest.split_at(4);
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        if len > MAX_FRAME_LEN {
            bail!("Frame of {} bytes exceeds limit", len);
        }
        if body.len() < len {
            bail!("Truncated frame body at byte {}", data.len() - rest.len());
        }
        let (frame, tail) = body.split_at(len);
        frames.push(frame);
        rest = tail;
    }
    Ok(frames)
}

/// Read and decode every frame of the log at `path`.
pub async fn read(path: &Path) -> Result<Vec<StrokeFrame>> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read frame log {}", path.display()))?;

    split(&data)?
        .into_iter()
        .enumerate()
        .map(|(i, bytes)| {
            StrokeFrame::from_bytes(bytes).with_context(|| format!("Invalid frame #{}", i + 1))
        })
        .collect()
}
