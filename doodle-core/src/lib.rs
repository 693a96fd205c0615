//! # doodle-core
//!
//! Pure logic for the Doodle round synchronization core (no I/O, instant tests).
//!
//! This crate implements the round state machine, the anchored countdown and
//! the stroke replay pipeline without any channel, clock or disk access.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. Time is always passed in as a [`Timestamp`], and the
//! round state machine returns [`Action`]s instead of performing them. This
//! enables:
//! - Instant unit tests (no mocks, no async, no sleeping)
//! - Deterministic behavior (same input → same output, same pixels)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (word fetching, score persistence, replication) is performed
//! by `doodle-client`, which interprets the actions produced here.
//!
//! [`Timestamp`]: doodle_types::Timestamp

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod replay;
pub mod round;
pub mod stroke;
pub mod surface;
pub mod timer;

pub use error::RoundError;
pub use replay::{Delivery, Disposition, ReplayBuffer, ReplicationGap, DEFAULT_REORDER_WINDOW};
pub use round::{
    normalize_guess, Action, Round, RoundLimits, MAX_ROUND_SECS, MIN_ROUND_SECS,
};
pub use stroke::{BrushStyle, StrokeCanvas};
pub use surface::{ReplaySurface, SurfaceError, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use timer::{format_clock, Countdown, RoundTimer, Thresholds, TimerEvent};
