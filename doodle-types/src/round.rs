//! Round state and the round event feed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{RoundId, Timestamp, WireError};

/// Author name used for records the coordinator writes itself.
pub const SYSTEM_AUTHOR: &str = "System";

/// Lifecycle phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No round running (lobby)
    #[default]
    Idle,
    /// Word assigned, timer running, guesses accepted
    Active,
    /// Someone guessed the word
    Solved,
    /// The timer ran out
    Expired,
}

impl RoundPhase {
    /// Whether a round has finished (solved or expired).
    pub fn is_finished(&self) -> bool {
        matches!(self, RoundPhase::Solved | RoundPhase::Expired)
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundPhase::Idle => "idle",
            RoundPhase::Active => "active",
            RoundPhase::Solved => "solved",
            RoundPhase::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// How urgent the remaining time is, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    /// Plenty of time
    Normal,
    /// Thirty seconds or less
    Warning,
    /// Ten seconds or less
    Critical,
}

/// One entry in a round's guess log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRecord {
    /// Who submitted it ([`SYSTEM_AUTHOR`] for coordinator notes)
    pub author: String,
    /// The text as submitted, untrimmed
    pub text: String,
    /// Whether it matched the secret word
    pub matched_word: bool,
    /// When the coordinator accepted it
    pub submitted_at: Timestamp,
}

impl GuessRecord {
    /// A record written by the coordinator itself.
    pub fn system(text: impl Into<String>, at: Timestamp) -> Self {
        Self {
            author: SYSTEM_AUTHOR.to_string(),
            text: text.into(),
            matched_word: false,
            submitted_at: at,
        }
    }

    /// Whether this record was written by the coordinator.
    pub fn is_system(&self) -> bool {
        self.author == SYSTEM_AUTHOR
    }
}

/// Events published by the coordinator to presentation and scoring.
///
/// Phase transitions each produce exactly one event; timer cues
/// (`Tick`, `Warning`) ride on the same feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundEvent {
    /// A round started (Idle/Solved/Expired → Active).
    Started {
        /// The new round
        round: RoundId,
        /// Configured length
        duration_secs: u32,
        /// Anchor instant of the countdown
        started_at: Timestamp,
    },
    /// A guess was appended without solving the round.
    GuessRecorded {
        /// Round the guess belongs to
        round: RoundId,
        /// The appended record
        record: GuessRecord,
    },
    /// The word was guessed (Active → Solved).
    Solved {
        /// The solved round
        round: RoundId,
        /// Who guessed it
        author: String,
        /// The secret word
        word: String,
        /// Points awarded
        score_delta: u32,
        /// Session score after the award
        score: u32,
    },
    /// Time ran out (Active → Expired).
    Expired {
        /// The expired round
        round: RoundId,
        /// The secret word, now revealed
        word: String,
    },
    /// The integer second changed while the round is active.
    Tick {
        /// Seconds left
        remaining_secs: u32,
        /// Presentation band
        urgency: Urgency,
        /// Alternates on every critical tick so consecutive cues differ
        high_tone: bool,
    },
    /// The countdown entered its final seconds.
    Warning {
        /// Seconds left
        remaining_secs: u32,
    },
    /// Back to the lobby (any → Idle); score reset to zero.
    ReturnedToLobby,
}

impl RoundEvent {
    /// The phase the round is in once this event has been published.
    pub fn phase(&self) -> RoundPhase {
        match self {
            RoundEvent::Started { .. }
            | RoundEvent::GuessRecorded { .. }
            | RoundEvent::Tick { .. }
            | RoundEvent::Warning { .. } => RoundPhase::Active,
            RoundEvent::Solved { .. } => RoundPhase::Solved,
            RoundEvent::Expired { .. } => RoundPhase::Expired,
            RoundEvent::ReturnedToLobby => RoundPhase::Idle,
        }
    }

    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        rmp_serde::to_vec(self).map_err(WireError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        rmp_serde::from_slice(bytes).map_err(WireError::Deserialization)
    }
}
