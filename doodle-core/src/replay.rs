//! Ordered replay of replicated stroke frames.
//!
//! The stroke channel delivers [`StrokeFrame`]s at least once, with at most
//! bounded reordering. This module provides the receiving side:
//! - Frames are released strictly in `seq` order
//! - Duplicates (anything at or below the contiguous point) are dropped
//! - Early frames are held until the missing ones arrive, up to a window
//! - When the window overflows, the missing range is skipped and reported
//!
//! Sequence numbers start at 1 for every round; the sender restarts its
//! counter whenever a new [`RoundId`] is issued.

use std::collections::BTreeMap;
use std::fmt;

use doodle_types::{CanvasEvent, RoundId, StrokeFrame};

/// Default number of out-of-order frames held before skipping a gap.
pub const DEFAULT_REORDER_WINDOW: usize = 64;

/// A range of frames that never arrived and was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationGap {
    /// First missing sequence number
    pub first: u64,
    /// Last missing sequence number
    pub last: u64,
}

impl ReplicationGap {
    /// Number of frames skipped.
    pub fn len(&self) -> u64 {
        (self.last - self.first).saturating_add(1)
    }

    /// Always false; a gap covers at least one frame.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for ReplicationGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frames {}..={} skipped", self.first, self.last)
    }
}

/// What happened to the frame passed to [`ReplayBuffer::receive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Released for application (possibly with earlier held frames).
    Ready,
    /// Stored until the frames before it arrive.
    Held,
    /// Already seen; dropped.
    Duplicate,
    /// Tagged with another round; dropped.
    ForeignRound,
    /// Carries a malformed segment; dropped and later skipped as a gap.
    Invalid,
}

/// Result of feeding one frame into the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Events to apply to the surface, in order.
    pub ready: Vec<CanvasEvent>,
    /// Ranges skipped to make progress.
    pub gaps: Vec<ReplicationGap>,
    /// Fate of the received frame itself.
    pub disposition: Disposition,
}

impl Delivery {
    fn dropped(disposition: Disposition) -> Self {
        Self {
            ready: Vec::new(),
            gaps: Vec::new(),
            disposition,
        }
    }
}

/// Reorders and deduplicates the frames of the current round.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    round: Option<RoundId>,
    /// Highest seq released with nothing missing below it.
    contiguous: u64,
    pending: BTreeMap<u64, CanvasEvent>,
    window: usize,
}

impl ReplayBuffer {
    /// Create a buffer with the default reorder window.
    pub fn new() -> Self {
        Self::with_window(DEFAULT_REORDER_WINDOW)
    }

    /// Create a buffer holding at most `window` early frames (minimum 1).
    pub fn with_window(window: usize) -> Self {
        Self {
            round: None,
            contiguous: 0,
            pending: BTreeMap::new(),
            window: window.max(1),
        }
    }

    /// Follow a new round. Everything held for the previous one is dropped.
    pub fn reset(&mut self, round: Option<RoundId>) {
        self.round = round;
        self.contiguous = 0;
        self.pending.clear();
    }

    /// Round currently being followed.
    pub fn round(&self) -> Option<RoundId> {
        self.round
    }

    /// Highest sequence number released without gaps below it.
    pub fn contiguous_seq(&self) -> u64 {
        self.contiguous
    }

    /// Number of early frames being held.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Accept one frame from the channel.
    pub fn receive(&mut self, frame: StrokeFrame) -> Delivery {
        if self.round != Some(frame.round) {
            return Delivery::dropped(Disposition::ForeignRound);
        }
        if frame.validate().is_err() {
            return Delivery::dropped(Disposition::Invalid);
        }

        let seq = frame.seq;
        if seq <= self.contiguous || self.pending.contains_key(&seq) {
            return Delivery::dropped(Disposition::Duplicate);
        }

        self.pending.insert(seq, frame.event);

        let mut gaps = Vec::new();
        if self.pending.len() > self.window {
            gaps.extend(self.skip_to_first_pending());
        }
        let ready = self.drain_contiguous();

        let disposition = if seq <= self.contiguous {
            Disposition::Ready
        } else {
            Disposition::Held
        };

        Delivery {
            ready,
            gaps,
            disposition,
        }
    }

    /// Release everything still held, skipping whatever is missing.
    ///
    /// Used when the round ends and no more frames will arrive.
    pub fn flush(&mut self) -> (Vec<CanvasEvent>, Vec<ReplicationGap>) {
        let mut ready = Vec::new();
        let mut gaps = Vec::new();
        while !self.pending.is_empty() {
            gaps.extend(self.skip_to_first_pending());
            ready.extend(self.drain_contiguous());
        }
        (ready, gaps)
    }

    /// Move the contiguous point to just below the first held frame.
    fn skip_to_first_pending(&mut self) -> Option<ReplicationGap> {
        let first_pending = *self.pending.keys().next()?;
        if first_pending <= self.contiguous.saturating_add(1) {
            return None;
        }
        let gap = ReplicationGap {
            first: self.contiguous + 1,
            last: first_pending - 1,
        };
        self.contiguous = first_pending - 1;
        Some(gap)
    }

    fn drain_contiguous(&mut self) -> Vec<CanvasEvent> {
        let mut ready = Vec::new();
        // seq is peer-supplied; u64::MAX is the last frame a round can hold
        let mut next = self.contiguous.checked_add(1);
        while let Some(seq) = next {
            let Some(event) = self.pending.remove(&seq) else {
                break;
            };
            ready.push(event);
            self.contiguous = seq;
            next = seq.checked_add(1);
        }
        ready
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}
