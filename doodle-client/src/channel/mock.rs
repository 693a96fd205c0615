//! Mock stroke channel for testing.
//!
//! Captures sent frames for verification and can be told to fail.

use super::{ChannelError, StrokeChannel};
use async_trait::async_trait;
use doodle_types::{StrokeFrame, WireError};
use std::sync::{Arc, Mutex};

/// Mock stroke channel for testing.
#[derive(Debug, Default)]
pub struct MockChannel {
    inner: Arc<Mutex<MockChannelInner>>,
}

#[derive(Debug, Default)]
struct MockChannelInner {
    sent: Vec<Vec<u8>>,
    closed: bool,
    fail_next_send: Option<String>,
}

impl MockChannel {
    /// Create a new open mock channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of every frame sent so far.
    pub fn sent_messages(&self) -> Vec<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.sent.clone()
    }

    /// Every frame sent so far, decoded.
    pub fn sent_frames(&self) -> Result<Vec<StrokeFrame>, WireError> {
        let inner = self.inner.lock().unwrap();
        inner.sent.iter().map(|b| StrokeFrame::from_bytes(b)).collect()
    }

    /// Cause the next send() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(error.to_string());
    }

    /// Reject all further sends.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
    }

    /// Clear captured frames and failure flags.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockChannelInner::default();
    }
}

impl Clone for MockChannel {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl StrokeChannel for MockChannel {
    async fn send(&self, data: &[u8]) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.closed {
            return Err(ChannelError::Closed);
        }

        // Check for forced failure
        if let Some(error) = inner.fail_next_send.take() {
            return Err(ChannelError::SendFailed(error));
        }

        inner.sent.push(data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doodle_types::{CanvasEvent, RoundId};

    #[tokio::test]
    async fn captures_sent_frames() {
        let channel = MockChannel::new();
        let frame = StrokeFrame {
            round: RoundId::new(),
            seq: 1,
            event: CanvasEvent::Clear,
        };

        channel.send(&frame.to_bytes().unwrap()).await.unwrap();

        assert_eq!(channel.sent_messages().len(), 1);
        assert_eq!(channel.sent_frames().unwrap(), vec![frame]);
    }

    #[tokio::test]
    async fn forced_send_failure() {
        let channel = MockChannel::new();
        channel.fail_next_send("congested");

        assert!(matches!(
            channel.send(b"data").await,
            Err(ChannelError::SendFailed(_))
        ));

        // Next send should work
        channel.send(b"data").await.unwrap();
        assert_eq!(channel.sent_messages().len(), 1);
    }

    #[tokio::test]
    async fn closed_channel_rejects() {
        let channel = MockChannel::new();
        let shared = channel.clone();
        shared.close();

        assert!(matches!(
            channel.send(b"data").await,
            Err(ChannelError::Closed)
        ));

        channel.reset();
        channel.send(b"data").await.unwrap();
    }
}
