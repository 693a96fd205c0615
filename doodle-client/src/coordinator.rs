//! Round coordinator - the single owner of round state.
//!
//! The coordinator runs as one tokio task reading a command queue. Every
//! transition, guess append and canvas mutation happens inside that task,
//! so concurrent callers are linearized by arrival order and no lock guards
//! the round. Callers talk to it through a cloneable [`CoordinatorHandle`].
//!
//! # Architecture
//!
//! ```text
//! CoordinatorHandle ──mpsc──▶ Coordinator task ──▶ WordSource / ScoreStore
//!        ▲                      │        │                StrokeChannel
//!        └──oneshot replies─────┘        │
//!                                        ├──broadcast──▶ RoundEvent feed
//!                                        └──watch──────▶ Countdown readers
//! ```
//!
//! The task interprets the [`Action`]s produced by the pure state machine
//! in `doodle-core` and polls the [`RoundTimer`] on a fixed interval.
//!
//! # Example
//!
//! ```ignore
//! let handle = Coordinator::spawn(&GameConfig::default(), collaborators).await?;
//! let mut events = handle.subscribe();
//!
//! handle.start_round(Some(60)).await?;
//! handle.submit_guess("ana", "cat").await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use doodle_core::{
    Action, BrushStyle, Countdown, Disposition, ReplayBuffer, ReplaySurface, Round, RoundError,
    RoundTimer, StrokeCanvas, SurfaceError, TimerEvent,
};
use doodle_types::{
    CanvasEvent, GuessRecord, RoundEvent, RoundId, RoundPhase, StrokeFrame, StrokeSegment,
    Urgency, WireError,
};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;

use crate::channel::{ChannelError, StrokeChannel};
use crate::clock::Clock;
use crate::config::{ConfigError, GameConfig};
use crate::score::ScoreStore;
use crate::words::WordSource;

/// Commands buffered before callers wait for the coordinator.
const COMMAND_QUEUE: usize = 64;

/// Coordinator errors.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The round rejected the operation.
    #[error(transparent)]
    Round(#[from] RoundError),

    /// A frame could not be encoded or decoded.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// A local canvas event could not be replicated.
    #[error("stroke channel error: {0}")]
    Channel(#[from] ChannelError),

    /// The configuration is unusable.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The canvas could not be created.
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// The coordinator task is gone.
    #[error("coordinator is shut down")]
    Shutdown,
}

impl CoordinatorError {
    /// The round error behind this failure, if any.
    pub fn round_error(&self) -> Option<&RoundError> {
        match self {
            CoordinatorError::Round(e) => Some(e),
            _ => None,
        }
    }
}

/// External collaborators of the coordinator.
#[derive(Clone)]
pub struct Collaborators {
    /// Secret word supplier.
    pub words: Arc<dyn WordSource>,
    /// Session score persistence.
    pub scores: Arc<dyn ScoreStore>,
    /// Outbound stroke replication.
    pub channel: Arc<dyn StrokeChannel>,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
}

/// Point-in-time view of the round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSnapshot {
    /// Current round, `None` in the lobby.
    pub round: Option<RoundId>,
    /// Current phase.
    pub phase: RoundPhase,
    /// The word, revealed only once the round is over.
    pub word: Option<String>,
    /// Guesses of the current round.
    pub guesses: Vec<GuessRecord>,
    /// Session score.
    pub score: u32,
    /// Configured length of the current round.
    pub duration_secs: u32,
    /// Seconds left (full duration when the timer is stopped).
    pub remaining_secs: u32,
    /// Presentation band for `remaining_secs`.
    pub urgency: Urgency,
    /// Checksum of the local surface.
    pub surface_checksum: u64,
}

type Reply<T> = oneshot::Sender<Result<T, CoordinatorError>>;

enum Command {
    StartRound {
        duration_secs: Option<u32>,
        reply: Reply<RoundId>,
    },
    SubmitGuess {
        author: String,
        text: String,
        reply: Reply<bool>,
    },
    ReturnToLobby {
        reply: oneshot::Sender<()>,
    },
    BeginStroke {
        x: f32,
        y: f32,
        reply: Reply<()>,
    },
    ExtendStroke {
        x: f32,
        y: f32,
        style: BrushStyle,
        reply: Reply<Option<StrokeSegment>>,
    },
    EndStroke {
        reply: oneshot::Sender<()>,
    },
    ClearCanvas {
        reply: Reply<()>,
    },
    ReceiveFrame {
        frame: StrokeFrame,
        reply: oneshot::Sender<Disposition>,
    },
    Poll {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<RoundSnapshot>,
    },
    SecretWord {
        reply: oneshot::Sender<Option<String>>,
    },
    Surface {
        reply: oneshot::Sender<ReplaySurface>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// The coordinator task state.
///
/// Only reachable through [`Coordinator::spawn`]; all interaction goes
/// through the returned handle.
pub struct Coordinator {
    round: Round,
    timer: RoundTimer,
    canvas: StrokeCanvas,
    replay: ReplayBuffer,
    next_seq: u64,
    default_duration_secs: u32,
    word_timeout: Duration,
    collaborators: Collaborators,
    events: broadcast::Sender<RoundEvent>,
    countdown: watch::Sender<Option<Countdown>>,
}

impl Coordinator {
    /// Validate the config, restore the persisted score and start the task.
    ///
    /// A score that fails to load is logged and the session starts at zero.
    pub async fn spawn(
        config: &GameConfig,
        collaborators: Collaborators,
    ) -> Result<CoordinatorHandle, CoordinatorError> {
        config.validate()?;
        let surface = ReplaySurface::new(config.canvas.width, config.canvas.height)?;

        let score = match collaborators.scores.load().await {
            Ok(score) => score,
            Err(e) => {
                tracing::warn!("Failed to load score, starting at 0: {}", e);
                0
            }
        };

        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
        let (events, _) = broadcast::channel(config.replication.channel_capacity);
        let (countdown, countdown_rx) = watch::channel(None);

        let handle = CoordinatorHandle {
            commands: command_tx,
            events: events.clone(),
            countdown: countdown_rx,
            clock: Arc::clone(&collaborators.clock),
        };

        let coordinator = Coordinator {
            round: Round::with_score(config.limits(), score),
            timer: RoundTimer::with_thresholds(config.thresholds()),
            canvas: StrokeCanvas::new(surface),
            replay: ReplayBuffer::with_window(config.replication.reorder_window),
            next_seq: 1,
            default_duration_secs: config.round.default_duration_secs,
            word_timeout: config.word_timeout(),
            collaborators,
            events,
            countdown,
        };

        tokio::spawn(coordinator.run(command_rx, config.poll_interval()));
        Ok(handle)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>, poll_interval: Duration) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "Coordinator started (poll interval: {}ms, score: {})",
            poll_interval.as_millis(),
            self.round.score()
        );

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                _ = ticker.tick() => self.observe_timer().await,
            }
        }

        tracing::info!("Coordinator stopped");
    }

    async fn handle(&mut self, command: Command) {
        // A dropped reply receiver means the caller gave up; nothing to do
        match command {
            Command::StartRound {
                duration_secs,
                reply,
            } => {
                let result = self.start_round(duration_secs).await;
                let _ = reply.send(result);
            }
            Command::SubmitGuess {
                author,
                text,
                reply,
            } => {
                let result = self.submit_guess(&author, &text).await;
                let _ = reply.send(result);
            }
            Command::ReturnToLobby { reply } => {
                let actions = self.round.return_to_lobby();
                self.execute(actions).await;
                let _ = reply.send(());
            }
            Command::BeginStroke { x, y, reply } => {
                let result = self.drawing_round().map(|_| self.canvas.begin_stroke(x, y));
                let _ = reply.send(result.map_err(CoordinatorError::from));
            }
            Command::ExtendStroke { x, y, style, reply } => {
                let result = self.extend_stroke(x, y, &style).await;
                let _ = reply.send(result);
            }
            Command::EndStroke { reply } => {
                self.canvas.end_stroke();
                let _ = reply.send(());
            }
            Command::ClearCanvas { reply } => {
                let result = self.clear_canvas().await;
                let _ = reply.send(result);
            }
            Command::ReceiveFrame { frame, reply } => {
                let _ = reply.send(self.receive_frame(frame));
            }
            Command::Poll { reply } => {
                self.observe_timer().await;
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::SecretWord { reply } => {
                let _ = reply.send(self.round.word().map(str::to_string));
            }
            Command::Surface { reply } => {
                let _ = reply.send(self.canvas.surface().clone());
            }
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn start_round(&mut self, duration_secs: Option<u32>) -> Result<RoundId, CoordinatorError> {
        let duration_secs = duration_secs.unwrap_or(self.default_duration_secs);
        if let Err(e) = self.round.check_start(duration_secs) {
            tracing::debug!("Rejected round start ({}s): {}", duration_secs, e);
            return Err(e.into());
        }

        let fetch = self.collaborators.words.fetch_word(duration_secs);
        let word = match tokio::time::timeout(self.word_timeout, fetch).await {
            Ok(Ok(word)) => word,
            Ok(Err(e)) => {
                tracing::warn!("Word source failed: {}", e);
                return Err(RoundError::WordUnavailable(e.to_string()).into());
            }
            Err(_) => {
                tracing::warn!(
                    "Word source timed out after {}ms",
                    self.word_timeout.as_millis()
                );
                return Err(RoundError::WordUnavailable("word source timed out".into()).into());
            }
        };

        let now = self.collaborators.clock.now();
        let actions = self.round.start(&word, duration_secs, now).map_err(|e| {
            tracing::warn!("Word source returned an unusable word: {}", e);
            e
        })?;
        self.execute(actions).await;

        self.round.id().ok_or_else(|| {
            RoundError::RoundNotActive {
                phase: self.round.phase(),
            }
            .into()
        })
    }

    async fn submit_guess(&mut self, author: &str, text: &str) -> Result<bool, CoordinatorError> {
        // A guess that arrives after the deadline loses to the expiry
        self.observe_timer().await;

        let now = self.collaborators.clock.now();
        let actions = self.round.submit_guess(author, text, now).map_err(|e| {
            tracing::debug!("Rejected guess from {}: {}", author, e);
            e
        })?;
        let solved = self.round.phase() == RoundPhase::Solved;
        self.execute(actions).await;
        Ok(solved)
    }

    async fn extend_stroke(
        &mut self,
        x: f32,
        y: f32,
        style: &BrushStyle,
    ) -> Result<Option<StrokeSegment>, CoordinatorError> {
        self.drawing_round()?;
        let Some(segment) = self.canvas.extend_stroke(x, y, style) else {
            return Ok(None);
        };
        self.replicate(CanvasEvent::Segment(segment.clone())).await?;
        Ok(Some(segment))
    }

    async fn clear_canvas(&mut self) -> Result<(), CoordinatorError> {
        self.drawing_round()?;
        self.canvas.clear();
        self.replicate(CanvasEvent::Clear).await
    }

    /// Local drawing is only accepted while the round is running.
    fn drawing_round(&self) -> Result<RoundId, RoundError> {
        match (self.round.phase(), self.round.id()) {
            (RoundPhase::Active, Some(id)) => Ok(id),
            (phase, _) => Err(RoundError::RoundNotActive { phase }),
        }
    }

    async fn replicate(&mut self, event: CanvasEvent) -> Result<(), CoordinatorError> {
        let round = self.drawing_round()?;
        let frame = StrokeFrame {
            round,
            seq: self.next_seq,
            event,
        };
        self.next_seq += 1;

        let bytes = frame.to_bytes()?;
        self.collaborators.channel.send(&bytes).await.map_err(|e| {
            tracing::warn!("Failed to replicate frame {}: {}", frame.seq, e);
            CoordinatorError::from(e)
        })
    }

    fn receive_frame(&mut self, frame: StrokeFrame) -> Disposition {
        let seq = frame.seq;
        let delivery = self.replay.receive(frame);

        for gap in delivery.gaps {
            tracing::warn!("{}", RoundError::ReplicationGap(gap));
        }
        for event in &delivery.ready {
            self.canvas.apply_event(event);
        }
        match delivery.disposition {
            Disposition::Duplicate | Disposition::ForeignRound => {
                tracing::debug!("Dropped frame {} ({:?})", seq, delivery.disposition);
            }
            Disposition::Invalid => {
                tracing::warn!("Dropped malformed frame {}", seq);
            }
            Disposition::Ready | Disposition::Held => {}
        }
        delivery.disposition
    }

    /// Release frames still held for a round that just ended.
    fn settle_replay(&mut self) {
        let (ready, gaps) = self.replay.flush();
        for gap in gaps {
            tracing::warn!("{} at round end", RoundError::ReplicationGap(gap));
        }
        for event in &ready {
            self.canvas.apply_event(event);
        }
    }

    async fn observe_timer(&mut self) {
        if !self.timer.is_armed() {
            return;
        }

        let now = self.collaborators.clock.now();
        for event in self.timer.observe(now) {
            match event {
                TimerEvent::Tick {
                    remaining_secs,
                    urgency,
                    high_tone,
                } => self.publish(RoundEvent::Tick {
                    remaining_secs,
                    urgency,
                    high_tone,
                }),
                TimerEvent::Warning { remaining_secs } => {
                    self.publish(RoundEvent::Warning { remaining_secs })
                }
                TimerEvent::Expired => match self.round.expire(now) {
                    Ok(actions) => self.execute(actions).await,
                    Err(e) => tracing::debug!("Ignoring timer expiry: {}", e),
                },
            }
        }
    }

    async fn execute(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::ResetCanvas => {
                    self.canvas.reset();
                    self.replay.reset(self.round.id());
                    self.next_seq = 1;
                }
                Action::ArmTimer {
                    anchor,
                    duration_secs,
                } => match self.timer.start(anchor, duration_secs) {
                    Ok(countdown) => {
                        self.countdown.send_replace(Some(countdown));
                    }
                    Err(e) => tracing::error!("Failed to arm timer: {}", e),
                },
                Action::StopTimer => {
                    self.timer.stop();
                    self.countdown.send_replace(None);
                }
                Action::PersistScore(score) => {
                    if let Err(e) = self.collaborators.scores.save(score).await {
                        tracing::error!("Failed to persist score {}: {}", score, e);
                    }
                }
                Action::ClearScore => {
                    if let Err(e) = self.collaborators.scores.clear().await {
                        tracing::error!("Failed to clear score: {}", e);
                    }
                }
                Action::Emit(event) => {
                    if event.phase().is_finished() {
                        self.settle_replay();
                    }
                    self.publish(event);
                }
            }
        }
    }

    fn publish(&self, event: RoundEvent) {
        match &event {
            RoundEvent::Started {
                round,
                duration_secs,
                ..
            } => tracing::info!("Round {} started ({}s)", round, duration_secs),
            RoundEvent::Solved {
                round,
                author,
                score,
                ..
            } => tracing::info!("Round {} solved by {} (score: {})", round, author, score),
            RoundEvent::Expired { round, .. } => tracing::info!("Round {} expired", round),
            RoundEvent::Warning { remaining_secs } => {
                tracing::info!("Round ending in {}s", remaining_secs)
            }
            RoundEvent::ReturnedToLobby => tracing::info!("Returned to lobby"),
            RoundEvent::GuessRecorded { record, .. } => {
                tracing::debug!("Guess recorded from {}", record.author)
            }
            RoundEvent::Tick { .. } => {}
        }

        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn snapshot(&self) -> RoundSnapshot {
        let now = self.collaborators.clock.now();
        let phase = self.round.phase();
        let word = match phase {
            RoundPhase::Active => None,
            _ => self.round.word().map(str::to_string),
        };

        RoundSnapshot {
            round: self.round.id(),
            phase,
            word,
            guesses: self.round.guess_log().to_vec(),
            score: self.round.score(),
            duration_secs: self.round.duration_secs(),
            remaining_secs: self.timer.remaining_secs(now),
            urgency: self.timer.urgency(now),
            surface_checksum: self.canvas.surface().checksum(),
        }
    }
}

/// Cloneable handle to a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<RoundEvent>,
    countdown: watch::Receiver<Option<Countdown>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoordinatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorHandle")
            .field("closed", &self.commands.is_closed())
            .field("countdown", &*self.countdown.borrow())
            .finish()
    }
}

impl CoordinatorHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CoordinatorError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| CoordinatorError::Shutdown)?;
        response.await.map_err(|_| CoordinatorError::Shutdown)
    }

    /// Start a round of `duration_secs` (the configured default if `None`).
    ///
    /// Fails with `InvalidDuration`, `RoundInProgress` or `WordUnavailable`;
    /// the phase is unchanged on failure.
    pub async fn start_round(&self, duration_secs: Option<u32>) -> Result<RoundId, CoordinatorError> {
        self.request(|reply| Command::StartRound {
            duration_secs,
            reply,
        })
        .await?
    }

    /// Submit a guess. Returns whether it solved the round.
    pub async fn submit_guess(
        &self,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<bool, CoordinatorError> {
        let author = author.into();
        let text = text.into();
        self.request(|reply| Command::SubmitGuess {
            author,
            text,
            reply,
        })
        .await?
    }

    /// Abandon the round and reset the session. Accepted in every phase.
    pub async fn return_to_lobby(&self) -> Result<(), CoordinatorError> {
        self.request(|reply| Command::ReturnToLobby { reply }).await
    }

    /// Pointer down on the local canvas.
    pub async fn begin_stroke(&self, x: f32, y: f32) -> Result<(), CoordinatorError> {
        self.request(|reply| Command::BeginStroke { x, y, reply })
            .await?
    }

    /// Pointer move: draws and replicates one segment if a stroke is open.
    pub async fn extend_stroke(
        &self,
        x: f32,
        y: f32,
        style: BrushStyle,
    ) -> Result<Option<StrokeSegment>, CoordinatorError> {
        self.request(|reply| Command::ExtendStroke { x, y, style, reply })
            .await?
    }

    /// Pointer up.
    pub async fn end_stroke(&self) -> Result<(), CoordinatorError> {
        self.request(|reply| Command::EndStroke { reply }).await
    }

    /// Clear the canvas for everyone.
    pub async fn clear_canvas(&self) -> Result<(), CoordinatorError> {
        self.request(|reply| Command::ClearCanvas { reply }).await?
    }

    /// Apply a frame replicated by another participant of this round.
    ///
    /// Frames carrying a malformed segment fail with `Wire`, the same as
    /// [`receive_bytes`](Self::receive_bytes).
    pub async fn receive_frame(&self, frame: StrokeFrame) -> Result<Disposition, CoordinatorError> {
        frame.validate()?;
        self.request(|reply| Command::ReceiveFrame { frame, reply })
            .await
    }

    /// Decode and apply an encoded frame.
    pub async fn receive_bytes(&self, bytes: &[u8]) -> Result<Disposition, CoordinatorError> {
        let frame = StrokeFrame::from_bytes(bytes)?;
        self.receive_frame(frame).await
    }

    /// Observe the timer now instead of waiting for the next poll.
    pub async fn poll(&self) -> Result<(), CoordinatorError> {
        self.request(|reply| Command::Poll { reply }).await
    }

    /// Current round state. The word is hidden while the round is active.
    pub async fn snapshot(&self) -> Result<RoundSnapshot, CoordinatorError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// The secret word, for the drawer.
    pub async fn secret_word(&self) -> Result<Option<String>, CoordinatorError> {
        self.request(|reply| Command::SecretWord { reply }).await
    }

    /// Copy of the local surface.
    pub async fn surface(&self) -> Result<ReplaySurface, CoordinatorError> {
        self.request(|reply| Command::Surface { reply }).await
    }

    /// Subscribe to the round event feed.
    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    /// The armed countdown, read without contacting the task.
    pub fn countdown(&self) -> Option<Countdown> {
        *self.countdown.borrow()
    }

    /// Receiver notified whenever the countdown is armed or disarmed.
    pub fn watch_countdown(&self) -> watch::Receiver<Option<Countdown>> {
        self.countdown.clone()
    }

    /// Seconds left in the running round, computed locally.
    pub fn remaining_secs(&self) -> Option<u32> {
        self.countdown()
            .map(|countdown| countdown.remaining_secs(self.clock.now()))
    }

    /// Stop the coordinator task. Later requests fail with `Shutdown`.
    pub async fn shutdown(&self) -> Result<(), CoordinatorError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}
