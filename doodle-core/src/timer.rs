//! Anchored round countdown.
//!
//! Remaining time is never counted down. It is recomputed on every
//! observation from the absolute anchor instant, the configured duration and
//! the instant of observation:
//!
//! ```text
//! remaining(now) = max(0, duration - floor((now - anchor) / 1s))
//! ```
//!
//! so irregular polling, missed ticks and suspended processes cannot make it
//! drift. [`Countdown`] is that pure function; [`RoundTimer`] adds arming,
//! disarming and edge-triggered threshold events on top of it.

use doodle_types::{Timestamp, Urgency};

use crate::error::RoundError;

/// Immutable `(anchor, duration)` pair that answers "how long is left".
///
/// `Copy` and lock-free: any number of readers can hold a copy and poll it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    anchor: Timestamp,
    duration_secs: u32,
}

impl Countdown {
    /// Create a countdown. Fails with `InvalidDuration` for a zero duration.
    pub fn new(anchor: Timestamp, duration_secs: u32) -> Result<Self, RoundError> {
        if duration_secs == 0 {
            return Err(RoundError::InvalidDuration {
                secs: duration_secs,
                min: 1,
                max: u32::MAX,
            });
        }
        Ok(Self {
            anchor,
            duration_secs,
        })
    }

    /// The absolute start instant.
    pub fn anchor(&self) -> Timestamp {
        self.anchor
    }

    /// Configured length in seconds.
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// When the countdown reaches zero.
    pub fn deadline(&self) -> Timestamp {
        Timestamp::from_millis(
            self.anchor
                .as_millis()
                .saturating_add(u64::from(self.duration_secs) * 1000),
        )
    }

    /// Whole seconds left at `now`.
    ///
    /// An observer whose clock reads earlier than the anchor sees the full
    /// duration rather than more than it.
    pub fn remaining_secs(&self, now: Timestamp) -> u32 {
        let elapsed_ms = now.millis_since(self.anchor).max(0) as u64;
        let elapsed_secs = elapsed_ms / 1000;
        u64::from(self.duration_secs).saturating_sub(elapsed_secs) as u32
    }

    /// Whether the countdown has reached zero at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.remaining_secs(now) == 0
    }

    /// Fraction of the round already used, `0.0..=1.0`.
    pub fn progress(&self, now: Timestamp) -> f32 {
        let used = self.duration_secs - self.remaining_secs(now);
        used as f32 / self.duration_secs as f32
    }
}

/// Remaining-time boundaries for urgency classification and alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// At or below this many seconds the round is critical and `Warning` fires.
    pub warning_secs: u32,
    /// At or below this many seconds the round is in the caution band.
    pub caution_secs: u32,
}

impl Thresholds {
    /// Classify a remaining-seconds value. Pure, no state.
    pub fn urgency(&self, remaining_secs: u32) -> Urgency {
        if remaining_secs <= self.warning_secs {
            Urgency::Critical
        } else if remaining_secs <= self.caution_secs {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_secs: 10,
            caution_secs: 30,
        }
    }
}

/// Events produced by [`RoundTimer::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The observed integer second changed (only while time is left).
    Tick {
        /// Seconds left
        remaining_secs: u32,
        /// Presentation band
        urgency: Urgency,
        /// Alternates on every critical tick, starting low; always false outside it
        high_tone: bool,
    },
    /// First observation inside the warning band. Fires once per round.
    Warning {
        /// Seconds left
        remaining_secs: u32,
    },
    /// First observation at zero. Fires once per round.
    Expired,
}

/// Armable countdown with edge-triggered threshold events.
///
/// The only mutable state besides the armed [`Countdown`] is what the last
/// observation saw, which is used to detect transitions. It never feeds back
/// into the remaining-time computation.
#[derive(Debug, Clone)]
pub struct RoundTimer {
    thresholds: Thresholds,
    duration_secs: u32,
    countdown: Option<Countdown>,
    last_seen: Option<u32>,
    warned: bool,
    expired: bool,
    high_tone: bool,
}

impl RoundTimer {
    /// Create a disarmed timer with the default thresholds.
    pub fn new() -> Self {
        Self::with_thresholds(Thresholds::default())
    }

    /// Create a disarmed timer with custom thresholds.
    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            duration_secs: 0,
            countdown: None,
            last_seen: None,
            warned: false,
            expired: false,
            high_tone: false,
        }
    }

    /// Arm the timer at an absolute anchor.
    ///
    /// Re-arming discards all edge state from the previous run.
    pub fn start(&mut self, anchor: Timestamp, duration_secs: u32) -> Result<Countdown, RoundError> {
        let countdown = Countdown::new(anchor, duration_secs)?;
        *self = Self {
            duration_secs,
            countdown: Some(countdown),
            ..Self::with_thresholds(self.thresholds)
        };
        Ok(countdown)
    }

    /// Disarm. Remaining time reads as the full duration again and no
    /// further events fire until the next `start`.
    pub fn stop(&mut self) {
        self.countdown = None;
        self.last_seen = None;
    }

    /// Whether the timer is armed.
    pub fn is_armed(&self) -> bool {
        self.countdown.is_some()
    }

    /// The armed countdown, if any.
    pub fn countdown(&self) -> Option<Countdown> {
        self.countdown
    }

    /// The thresholds in use.
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Seconds left at `now`; the full configured duration when disarmed.
    pub fn remaining_secs(&self, now: Timestamp) -> u32 {
        match &self.countdown {
            Some(countdown) => countdown.remaining_secs(now),
            None => self.duration_secs,
        }
    }

    /// Urgency band at `now`.
    pub fn urgency(&self, now: Timestamp) -> Urgency {
        self.thresholds.urgency(self.remaining_secs(now))
    }

    /// Observe the timer at `now` and return the transitions since the
    /// previous observation, in order: tick, warning, expiry.
    ///
    /// Polling faster than once per second yields nothing between integer
    /// boundaries, so callers may poll as often as they like.
    pub fn observe(&mut self, now: Timestamp) -> Vec<TimerEvent> {
        let Some(countdown) = self.countdown else {
            return Vec::new();
        };

        let remaining = countdown.remaining_secs(now);
        let mut events = Vec::new();

        if self.last_seen != Some(remaining) && remaining > 0 {
            let urgency = self.thresholds.urgency(remaining);
            let high_tone = if urgency == Urgency::Critical {
                let tone = self.high_tone;
                self.high_tone = !self.high_tone;
                tone
            } else {
                false
            };
            events.push(TimerEvent::Tick {
                remaining_secs: remaining,
                urgency,
                high_tone,
            });
        }
        self.last_seen = Some(remaining);

        if !self.warned && remaining > 0 && remaining <= self.thresholds.warning_secs {
            self.warned = true;
            events.push(TimerEvent::Warning {
                remaining_secs: remaining,
            });
        }

        if !self.expired && remaining == 0 {
            self.expired = true;
            events.push(TimerEvent::Expired);
        }

        events
    }
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render seconds as `m:ss`.
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    fn count_expired(events: &[TimerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, TimerEvent::Expired))
            .count()
    }

    #[test]
    fn zero_duration_is_rejected() {
        assert!(matches!(
            Countdown::new(at(0), 0),
            Err(RoundError::InvalidDuration { secs: 0, .. })
        ));
        assert!(RoundTimer::new().start(at(0), 0).is_err());
    }

    #[test]
    fn remaining_floors_elapsed_seconds() {
        let countdown = Countdown::new(at(1_000), 60).unwrap();

        assert_eq!(countdown.remaining_secs(at(1_000)), 60);
        assert_eq!(countdown.remaining_secs(at(1_999)), 60);
        assert_eq!(countdown.remaining_secs(at(2_000)), 59);
        assert_eq!(countdown.remaining_secs(at(60_999)), 1);
        assert_eq!(countdown.remaining_secs(at(61_000)), 0);
        assert_eq!(countdown.remaining_secs(at(500_000)), 0);
    }

    #[test]
    fn remaining_never_increases() {
        let countdown = Countdown::new(at(12_345), 45).unwrap();
        let mut previous = u32::MAX;

        for millis in (0..70_000u64).step_by(37) {
            let remaining = countdown.remaining_secs(at(millis));
            assert!(remaining <= previous, "remaining rose at {}ms", millis);
            previous = remaining;
        }
    }

    #[test]
    fn poll_count_does_not_change_the_answer() {
        let mut polled = RoundTimer::new();
        polled.start(at(0), 90).unwrap();
        for millis in (0..41_300u64).step_by(10) {
            polled.observe(at(millis));
        }

        let mut fresh = RoundTimer::new();
        fresh.start(at(0), 90).unwrap();

        assert_eq!(
            polled.remaining_secs(at(41_300)),
            fresh.remaining_secs(at(41_300))
        );
        assert_eq!(polled.remaining_secs(at(41_300)), 49);
    }

    #[test]
    fn observer_behind_anchor_sees_full_duration() {
        let countdown = Countdown::new(at(10_000), 30).unwrap();
        assert_eq!(countdown.remaining_secs(at(4_000)), 30);
    }

    #[test]
    fn expired_fires_once_under_fast_polling() {
        let mut timer = RoundTimer::new();
        timer.start(at(0), 30).unwrap();

        // 1 kHz from one second before to one second after the boundary
        let mut events = Vec::new();
        for millis in 29_000..=31_000u64 {
            events.extend(timer.observe(at(millis)));
        }

        assert_eq!(count_expired(&events), 1);
    }

    #[test]
    fn warning_fires_once_entering_final_seconds() {
        let mut timer = RoundTimer::new();
        timer.start(at(0), 30).unwrap();

        let mut warnings = Vec::new();
        for millis in (0..30_000u64).step_by(100) {
            for event in timer.observe(at(millis)) {
                if let TimerEvent::Warning { remaining_secs } = event {
                    warnings.push(remaining_secs);
                }
            }
        }

        assert_eq!(warnings, vec![10]);
    }

    #[test]
    fn suspended_observer_jumps_straight_to_expiry() {
        let mut timer = RoundTimer::new();
        timer.start(at(0), 60).unwrap();
        timer.observe(at(1_000));

        // Process suspended for two minutes
        let events = timer.observe(at(121_000));

        assert_eq!(events, vec![TimerEvent::Expired]);
    }

    #[test]
    fn ticks_once_per_second_change() {
        let mut timer = RoundTimer::new();
        timer.start(at(0), 60).unwrap();

        let mut ticks = 0;
        for millis in (0..5_000u64).step_by(100) {
            ticks += timer
                .observe(at(millis))
                .iter()
                .filter(|e| matches!(e, TimerEvent::Tick { .. }))
                .count();
        }

        // 60, 59, 58, 57, 56
        assert_eq!(ticks, 5);
    }

    #[test]
    fn critical_ticks_alternate_tone() {
        let mut timer = RoundTimer::new();
        timer.start(at(0), 30).unwrap();
        timer.observe(at(0));

        let mut tones = Vec::new();
        for second in 20..23u64 {
            for event in timer.observe(at(second * 1000)) {
                if let TimerEvent::Tick {
                    urgency: Urgency::Critical,
                    high_tone,
                    ..
                } = event
                {
                    tones.push(high_tone);
                }
            }
        }

        assert_eq!(tones, vec![false, true, false]);
    }

    #[test]
    fn stop_resets_to_full_duration_and_silences_events() {
        let mut timer = RoundTimer::new();
        timer.start(at(0), 45).unwrap();
        timer.observe(at(20_000));

        timer.stop();

        assert!(!timer.is_armed());
        assert_eq!(timer.remaining_secs(at(50_000)), 45);
        assert!(timer.observe(at(50_000)).is_empty());
    }

    #[test]
    fn restart_rearms_threshold_events() {
        let mut timer = RoundTimer::new();
        timer.start(at(0), 30).unwrap();
        assert_eq!(count_expired(&timer.observe(at(30_000))), 1);

        timer.start(at(100_000), 30).unwrap();
        assert_eq!(count_expired(&timer.observe(at(130_000))), 1);
    }

    #[test]
    fn urgency_bands() {
        let thresholds = Thresholds::default();
        assert_eq!(thresholds.urgency(0), Urgency::Critical);
        assert_eq!(thresholds.urgency(10), Urgency::Critical);
        assert_eq!(thresholds.urgency(11), Urgency::Warning);
        assert_eq!(thresholds.urgency(30), Urgency::Warning);
        assert_eq!(thresholds.urgency(31), Urgency::Normal);
    }

    #[test]
    fn progress_and_deadline() {
        let countdown = Countdown::new(at(0), 60).unwrap();
        assert_eq!(countdown.progress(at(0)), 0.0);
        assert_eq!(countdown.progress(at(30_000)), 0.5);
        assert_eq!(countdown.progress(at(90_000)), 1.0);
        assert_eq!(countdown.deadline(), at(60_000));
        assert!(countdown.is_expired(at(60_000)));
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(90), "1:30");
        assert_eq!(format_clock(300), "5:00");
    }
}
