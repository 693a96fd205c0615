//! Stroke replication channel.
//!
//! The coordinator publishes every local canvas event as an encoded
//! [`StrokeFrame`](doodle_types::StrokeFrame). The channel only has to move
//! bytes: delivery is at-least-once with bounded reordering, and the
//! receiving side restores order with a replay buffer.
//!
//! # Implementations
//!
//! - [`LoopbackChannel`]: in-process fan-out over a tokio broadcast channel
//! - [`MockChannel`]: captures sent frames for verification

mod loopback;
mod mock;

pub use loopback::LoopbackChannel;
pub use mock::MockChannel;

use async_trait::async_trait;
use thiserror::Error;

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel was closed.
    #[error("channel closed")]
    Closed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Outbound side of stroke replication.
#[async_trait]
pub trait StrokeChannel: Send + Sync {
    /// Publish one encoded frame to the other participants.
    async fn send(&self, data: &[u8]) -> Result<(), ChannelError>;
}
