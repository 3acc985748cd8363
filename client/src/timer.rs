//! Locally ticking countdowns anchored to server-supplied durations.
//!
//! A countdown captures a local anchor instant and a total duration when it starts.
//! From then on the remaining time is derived from the local clock only; the server
//! never corrects a running countdown, the next snapshot simply replaces the phase.

use log::debug;
use std::time::{Duration, Instant};

const MAX_COUNTDOWN_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownKind {
    /// Typing challenge: anchored to the typing start timestamp plus the allotted time.
    Challenge,
    /// Resolution playback: anchored to the moment the remaining-time hint arrived.
    Resolution,
}

/// Result of advancing a countdown by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Running,
    /// Reached zero on this tick and stopped itself.
    Expired,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    kind: CountdownKind,
    anchor: Option<Instant>,
    total: Duration,
    near_expiry: Duration,
}

impl Countdown {
    pub fn new(kind: CountdownKind, near_expiry: Duration) -> Self {
        Self {
            kind,
            anchor: None,
            total: Duration::ZERO,
            near_expiry,
        }
    }

    pub fn kind(&self) -> CountdownKind {
        self.kind
    }

    /// Starts counting down `total` from `anchor`. No-op if already running.
    pub fn start(&mut self, anchor: Instant, total: Duration) -> bool {
        if self.is_running() {
            return false;
        }
        debug!("{:?} countdown started: {:.1}s", self.kind, total.as_secs_f64());
        self.anchor = Some(anchor);
        self.total = total;
        true
    }

    /// Starts from a duration in seconds as sent on the wire. Negative or
    /// non-finite values count as zero; anything past a day is capped.
    pub fn start_secs(&mut self, anchor: Instant, secs: f64) -> bool {
        let secs = if secs.is_finite() {
            secs.clamp(0.0, MAX_COUNTDOWN_SECS)
        } else {
            0.0
        };
        self.start(anchor, Duration::from_secs_f64(secs))
    }

    pub fn stop(&mut self) {
        if self.anchor.take().is_some() {
            debug!("{:?} countdown stopped", self.kind);
        }
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    /// max(0, anchor + total - now). Zero when not running.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.anchor {
            Some(anchor) => self
                .total
                .saturating_sub(now.saturating_duration_since(anchor)),
            None => Duration::ZERO,
        }
    }

    /// Whole seconds left, rounded up, for display.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        self.remaining(now).as_secs_f64().ceil() as u64
    }

    pub fn near_expiry(&self, now: Instant) -> bool {
        self.is_running() && self.remaining(now) <= self.near_expiry
    }

    pub fn tick(&mut self, now: Instant) -> Tick {
        if !self.is_running() {
            return Tick::Idle;
        }
        if self.remaining(now).is_zero() {
            self.stop();
            return Tick::Expired;
        }
        Tick::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn countdown(kind: CountdownKind) -> Countdown {
        Countdown::new(kind, Duration::from_secs(5))
    }

    #[test]
    fn test_countdown_starts_idle() {
        let mut timer = countdown(CountdownKind::Challenge);
        let now = Instant::now();
        assert!(!timer.is_running());
        assert_eq!(timer.remaining(now), Duration::ZERO);
        assert_eq!(timer.tick(now), Tick::Idle);
        assert!(!timer.near_expiry(now));
    }

    #[test]
    fn test_remaining_counts_down_from_anchor() {
        let mut timer = countdown(CountdownKind::Challenge);
        let start = Instant::now();
        timer.start_secs(start, 10.0);

        let later = start + Duration::from_millis(2_500);
        assert_approx_eq!(timer.remaining(later).as_secs_f64(), 7.5, 1e-6);
        assert_eq!(timer.remaining_secs(later), 8);
        assert!(!timer.near_expiry(later));
        assert!(timer.near_expiry(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_duplicate_start_is_noop() {
        let mut timer = countdown(CountdownKind::Resolution);
        let start = Instant::now();
        assert!(timer.start_secs(start, 6.0));
        assert!(!timer.start_secs(start + Duration::from_secs(3), 6.0));
        assert_eq!(timer.remaining_secs(start + Duration::from_secs(3)), 3);
    }

    #[test]
    fn test_tick_expires_once_and_stops() {
        let mut timer = countdown(CountdownKind::Challenge);
        let start = Instant::now();
        timer.start(start, Duration::from_millis(300));

        assert_eq!(timer.tick(start + Duration::from_millis(100)), Tick::Running);
        assert_eq!(timer.tick(start + Duration::from_millis(300)), Tick::Expired);
        assert!(!timer.is_running());
        assert_eq!(timer.tick(start + Duration::from_millis(400)), Tick::Idle);
    }

    #[test]
    fn test_resolution_display_is_monotonic_and_reaches_zero() {
        let mut timer = countdown(CountdownKind::Resolution);
        let start = Instant::now();
        timer.start_secs(start, 2.35);

        let mut last = u64::MAX;
        let mut now = start;
        while timer.tick(now) != Tick::Expired {
            let shown = timer.remaining_secs(now);
            assert!(shown <= last);
            last = shown;
            now += Duration::from_millis(100);
        }
        assert_eq!(timer.remaining_secs(now), 0);
        assert!(now <= start + Duration::from_millis(2_400));
    }

    #[test]
    fn test_negative_hint_counts_as_zero() {
        let mut timer = countdown(CountdownKind::Resolution);
        let start = Instant::now();
        timer.start_secs(start, -1.0);
        assert_eq!(timer.tick(start), Tick::Expired);
    }

    #[test]
    fn test_stop_is_safe_when_idle() {
        let mut timer = countdown(CountdownKind::Challenge);
        timer.stop();
        timer.stop();
        assert!(!timer.is_running());
    }
}
