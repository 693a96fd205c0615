//! In-process fan-out channel.
//!
//! Every subscriber gets its own receiver buffering up to `capacity`
//! frames. A subscriber that falls further behind loses the oldest frames,
//! which its replay buffer then reports as a gap.

use super::{ChannelError, StrokeChannel};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast-backed stroke channel.
#[derive(Debug, Clone)]
pub struct LoopbackChannel {
    sender: broadcast::Sender<Arc<Vec<u8>>>,
}

impl LoopbackChannel {
    /// Create a channel buffering `capacity` frames per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every frame sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Vec<u8>>> {
        self.sender.subscribe()
    }

    /// Current number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl StrokeChannel for LoopbackChannel {
    async fn send(&self, data: &[u8]) -> Result<(), ChannelError> {
        // No subscribers is not an error: nobody is watching yet
        let _ = self.sender.send(Arc::new(data.to_vec()));
        Ok(())
    }
}
