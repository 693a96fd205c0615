//! Observer-side canvas.
//!
//! A [`Spectator`] rebuilds the drawer's canvas from the replicated frames
//! alone. It follows whichever round the round event feed announces and
//! discards frames from any other round.

use doodle_core::{Disposition, ReplayBuffer, ReplaySurface, ReplicationGap, StrokeCanvas};
use doodle_types::{RoundEvent, RoundId, StrokeFrame, WireError};

/// Replay state for one observer.
#[derive(Debug, Clone)]
pub struct Spectator {
    canvas: StrokeCanvas,
    replay: ReplayBuffer,
    applied: u64,
    gaps: Vec<ReplicationGap>,
}

impl Spectator {
    /// A spectator drawing onto `surface` with the given reorder window.
    pub fn new(surface: ReplaySurface, reorder_window: usize) -> Self {
        Self {
            canvas: StrokeCanvas::new(surface),
            replay: ReplayBuffer::with_window(reorder_window),
            applied: 0,
            gaps: Vec::new(),
        }
    }

    /// Start following `round` on a blank surface.
    pub fn follow(&mut self, round: RoundId) {
        self.canvas.reset();
        self.replay.reset(Some(round));
        self.applied = 0;
        self.gaps.clear();
    }

    /// Round currently followed.
    pub fn round(&self) -> Option<RoundId> {
        self.replay.round()
    }

    /// React to a round event from the coordinator.
    pub fn on_round_event(&mut self, event: &RoundEvent) {
        match event {
            RoundEvent::Started { round, .. } => self.follow(*round),
            RoundEvent::Solved { .. } | RoundEvent::Expired { .. } => self.flush(),
            RoundEvent::ReturnedToLobby => {
                self.canvas.reset();
                self.replay.reset(None);
            }
            RoundEvent::GuessRecorded { .. }
            | RoundEvent::Tick { .. }
            | RoundEvent::Warning { .. } => {}
        }
    }

    /// Feed one decoded frame.
    pub fn receive(&mut self, frame: StrokeFrame) -> Disposition {
        let delivery = self.replay.receive(frame);
        for gap in &delivery.gaps {
            tracing::warn!("Spectator skipped {}", gap);
        }
        self.gaps.extend(delivery.gaps);
        for event in &delivery.ready {
            self.canvas.apply_event(event);
        }
        self.applied += delivery.ready.len() as u64;
        delivery.disposition
    }

    /// Feed one encoded frame.
    pub fn receive_bytes(&mut self, bytes: &[u8]) -> Result<Disposition, WireError> {
        let frame = StrokeFrame::from_bytes(bytes)?;
        Ok(self.receive(frame))
    }

    /// Apply everything still held; no more frames are expected.
    pub fn flush(&mut self) {
        let (ready, gaps) = self.replay.flush();
        for gap in &gaps {
            tracing::warn!("Spectator skipped {} at round end", gap);
        }
        self.gaps.extend(gaps);
        for event in &ready {
            self.canvas.apply_event(event);
        }
        self.applied += ready.len() as u64;
    }

    /// The reconstructed surface.
    pub fn surface(&self) -> &ReplaySurface {
        self.canvas.surface()
    }

    /// Frames applied since the current round started.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Gaps skipped since the current round started.
    pub fn gaps(&self) -> &[ReplicationGap] {
        &self.gaps
    }
}
