//! Error kinds of the round synchronization core.
//!
//! Every variant is recoverable: the operation that produced it is rejected
//! and the round stays in whatever phase it was in.

use doodle_types::RoundPhase;
use thiserror::Error;

use crate::replay::ReplicationGap;

/// Errors produced by round, timer and replay operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// Round length outside the accepted range.
    #[error("invalid round duration: {secs}s (allowed {min}..={max})")]
    InvalidDuration {
        /// Requested length in seconds
        secs: u32,
        /// Smallest accepted length
        min: u32,
        /// Largest accepted length
        max: u32,
    },

    /// A round is already running.
    #[error("a round is already in progress")]
    RoundInProgress,

    /// The operation needs an active round.
    #[error("round is not active (phase: {phase})")]
    RoundNotActive {
        /// Phase at the time of the call
        phase: RoundPhase,
    },

    /// The word source could not supply a word.
    #[error("no word available: {0}")]
    WordUnavailable(String),

    /// Remote stroke frames went missing and were skipped.
    #[error("replication gap: {0}")]
    ReplicationGap(ReplicationGap),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RoundError::InvalidDuration {
            secs: 5,
            min: 30,
            max: 300,
        };
        assert_eq!(
            err.to_string(),
            "invalid round duration: 5s (allowed 30..=300)"
        );

        let gap = RoundError::ReplicationGap(ReplicationGap { first: 4, last: 6 });
        assert_eq!(gap.to_string(), "replication gap: frames 4..=6 skipped");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RoundError>();
    }
}
