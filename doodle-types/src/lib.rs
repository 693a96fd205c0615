//! # doodle-types
//!
//! Wire format types for the Doodle round synchronization core.
//!
//! This crate provides the foundational types shared by every Doodle crate:
//! - [`Timestamp`], [`RoundId`] - Time anchoring and round identity
//! - [`StrokeSegment`], [`CanvasEvent`], [`StrokeFrame`] - Drawing replication units
//! - [`RoundPhase`], [`GuessRecord`], [`RoundEvent`] - Round state and the event feed
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod canvas;
mod error;
mod ids;
mod round;

pub use canvas::{
    CanvasEvent, NamedColor, Rgb, StrokeColor, StrokeFrame, StrokeMode, StrokeSegment,
    MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH,
};
pub use error::WireError;
pub use ids::{RoundId, Timestamp};
pub use round::{GuessRecord, RoundEvent, RoundPhase, Urgency, SYSTEM_AUTHOR};
