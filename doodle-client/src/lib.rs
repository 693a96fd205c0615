//! # doodle-client
//!
//! Runtime side of the Doodle round synchronization core.
//!
//! This is the library that game frontends embed. It drives the pure state
//! machines from `doodle-core` inside a single tokio task and connects them
//! to the outside world.
//!
//! ## Features
//!
//! - **Single owner**: one coordinator task serializes every transition
//! - **Anchored countdown**: readers compute remaining time locally from a
//!   published [`Countdown`](doodle_core::Countdown)
//! - **Pluggable collaborators**: word source, score store and stroke
//!   channel are traits with in-memory, file-backed and mock implementations
//! - **Spectating**: [`Spectator`] rebuilds the drawer's canvas from frames
//!
//! ## Example
//!
//! ```ignore
//! use doodle_client::{Collaborators, Coordinator, GameConfig, WordList};
//!
//! let handle = Coordinator::spawn(&GameConfig::default(), collaborators).await?;
//! handle.start_round(Some(90)).await?;
//! let solved = handle.submit_guess("ana", "banana").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod score;
pub mod spectator;
pub mod words;

pub use channel::{ChannelError, LoopbackChannel, MockChannel, StrokeChannel};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, GameConfig};
pub use coordinator::{Collaborators, Coordinator, CoordinatorError, CoordinatorHandle, RoundSnapshot};
pub use score::{FileScoreStore, MemoryScoreStore, ScoreStore, ScoreStoreError};
pub use spectator::Spectator;
pub use words::{MockWordSource, WordList, WordSource, WordSourceError, BUILTIN_WORDS};
