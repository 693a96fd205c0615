//! Round state machine for Doodle.
//!
//! This module provides a pure, side-effect-free state machine for a single
//! drawing round. Every transition validates its guard, updates the round
//! and returns a list of [`Action`]s. Fetching the word, arming the timer,
//! persisting the score and publishing events are performed by
//! `doodle-client`, not by this module.
//!
//! ```text
//!            StartRound                SubmitGuess (match)
//!   Idle ───────────────▶ Active ─────────────────────────▶ Solved
//!    ▲                     │  ▲                                │
//!    │                     │  └────────── StartRound ──────────┤
//!    │       timer expiry  ▼                                   │
//!    │                  Expired ───────── StartRound ──────────┘
//!    │                                                (back to Active)
//!    └──────────── ReturnToLobby (from any phase)
//! ```

use doodle_types::{GuessRecord, RoundEvent, RoundId, RoundPhase, Timestamp};

use crate::error::RoundError;

/// Shortest round any configuration may allow.
pub const MIN_ROUND_SECS: u32 = 30;

/// Longest round any configuration may allow.
pub const MAX_ROUND_SECS: u32 = 300;

/// Limits applied to every round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundLimits {
    /// Shortest accepted round in seconds.
    pub min_duration_secs: u32,
    /// Longest accepted round in seconds.
    pub max_duration_secs: u32,
    /// Points awarded for the first correct guess.
    pub points_per_solve: u32,
}

impl Default for RoundLimits {
    fn default() -> Self {
        Self {
            min_duration_secs: MIN_ROUND_SECS,
            max_duration_secs: MAX_ROUND_SECS,
            points_per_solve: 10,
        }
    }
}

impl RoundLimits {
    /// Check a requested round length.
    pub fn check_duration(&self, secs: u32) -> Result<(), RoundError> {
        if secs < self.min_duration_secs || secs > self.max_duration_secs {
            return Err(RoundError::InvalidDuration {
                secs,
                min: self.min_duration_secs,
                max: self.max_duration_secs,
            });
        }
        Ok(())
    }
}

/// Side effects requested by a transition, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Blank the surface, drop any stroke anchor and follow the current round.
    ResetCanvas,
    /// Start the countdown.
    ArmTimer {
        /// Absolute start instant
        anchor: Timestamp,
        /// Round length
        duration_secs: u32,
    },
    /// Disarm the countdown.
    StopTimer,
    /// Write the session score to the score store.
    PersistScore(u32),
    /// Remove the persisted score.
    ClearScore,
    /// Publish an event on the round feed.
    Emit(RoundEvent),
}

/// Lowercase and surrounding-whitespace-free form used for comparisons.
pub fn normalize_guess(text: &str) -> String {
    text.trim().to_lowercase()
}

/// The current round and the session score.
///
/// Invariants:
/// - `word` is set iff the phase is not `Idle`
/// - `started_at` is set iff the phase is not `Idle`
/// - the guess log only grows, until the next start or lobby return
#[derive(Debug, Clone)]
pub struct Round {
    limits: RoundLimits,
    id: Option<RoundId>,
    phase: RoundPhase,
    word: Option<String>,
    started_at: Option<Timestamp>,
    duration_secs: u32,
    guess_log: Vec<GuessRecord>,
    score: u32,
}

impl Round {
    /// A new idle round with a zero score.
    pub fn new(limits: RoundLimits) -> Self {
        Self::with_score(limits, 0)
    }

    /// A new idle round continuing a previously persisted score.
    pub fn with_score(limits: RoundLimits, score: u32) -> Self {
        Self {
            limits,
            id: None,
            phase: RoundPhase::Idle,
            word: None,
            started_at: None,
            duration_secs: 0,
            guess_log: Vec::new(),
            score,
        }
    }

    /// Configured limits.
    pub fn limits(&self) -> &RoundLimits {
        &self.limits
    }

    /// Identifier of the current round, `None` while idle.
    pub fn id(&self) -> Option<RoundId> {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// The secret word, `None` while idle.
    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    /// Anchor instant of the current round.
    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    /// Length of the current (or last) round.
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Guesses of the current round in submission order.
    pub fn guess_log(&self) -> &[GuessRecord] {
        &self.guess_log
    }

    /// Session score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Validate a start request without touching any state.
    ///
    /// The duration is checked before the phase, so an out-of-range request
    /// reports `InvalidDuration` even while a round is running. The
    /// coordinator calls this before fetching a word.
    pub fn check_start(&self, duration_secs: u32) -> Result<(), RoundError> {
        self.limits.check_duration(duration_secs)?;
        if self.phase == RoundPhase::Active {
            return Err(RoundError::RoundInProgress);
        }
        Ok(())
    }

    /// Idle/Solved/Expired → Active.
    pub fn start(
        &mut self,
        word: &str,
        duration_secs: u32,
        now: Timestamp,
    ) -> Result<Vec<Action>, RoundError> {
        self.check_start(duration_secs)?;

        let word = normalize_guess(word);
        if word.is_empty() {
            return Err(RoundError::WordUnavailable("empty word".into()));
        }

        let id = RoundId::new();
        self.id = Some(id);
        self.phase = RoundPhase::Active;
        self.word = Some(word);
        self.started_at = Some(now);
        self.duration_secs = duration_secs;
        self.guess_log.clear();

        Ok(vec![
            Action::ResetCanvas,
            Action::ArmTimer {
                anchor: now,
                duration_secs,
            },
            Action::Emit(RoundEvent::Started {
                round: id,
                duration_secs,
                started_at: now,
            }),
        ])
    }

    /// Record a guess; Active → Solved on a match.
    pub fn submit_guess(
        &mut self,
        author: &str,
        text: &str,
        now: Timestamp,
    ) -> Result<Vec<Action>, RoundError> {
        let (id, word) = self.active()?;

        let matched_word = normalize_guess(text) == word;
        let record = GuessRecord {
            author: author.to_string(),
            text: text.to_string(),
            matched_word,
            submitted_at: now,
        };
        self.guess_log.push(record.clone());

        if !matched_word {
            return Ok(vec![Action::Emit(RoundEvent::GuessRecorded {
                round: id,
                record,
            })]);
        }

        let delta = self.limits.points_per_solve;
        self.score = self.score.saturating_add(delta);
        self.phase = RoundPhase::Solved;

        Ok(vec![
            Action::StopTimer,
            Action::PersistScore(self.score),
            Action::Emit(RoundEvent::Solved {
                round: id,
                author: author.to_string(),
                word,
                score_delta: delta,
                score: self.score,
            }),
        ])
    }

    /// Active → Expired, revealing the word in a system record.
    pub fn expire(&mut self, now: Timestamp) -> Result<Vec<Action>, RoundError> {
        let (id, word) = self.active()?;

        self.guess_log.push(GuessRecord::system(
            format!("Time's up! The word was: {}", word),
            now,
        ));
        self.phase = RoundPhase::Expired;

        Ok(vec![
            Action::StopTimer,
            Action::Emit(RoundEvent::Expired { round: id, word }),
        ])
    }

    /// Any → Idle. Drops the round and resets the session score.
    pub fn return_to_lobby(&mut self) -> Vec<Action> {
        self.id = None;
        self.phase = RoundPhase::Idle;
        self.word = None;
        self.started_at = None;
        self.guess_log.clear();
        self.score = 0;

        vec![
            Action::StopTimer,
            Action::ResetCanvas,
            Action::ClearScore,
            Action::Emit(RoundEvent::ReturnedToLobby),
        ]
    }

    fn active(&self) -> Result<(RoundId, String), RoundError> {
        match (self.phase, self.id, &self.word) {
            (RoundPhase::Active, Some(id), Some(word)) => Ok((id, word.clone())),
            (phase, _, _) => Err(RoundError::RoundNotActive { phase }),
        }
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new(RoundLimits::default())
    }
}
