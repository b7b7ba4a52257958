//! Time sources.
//!
//! Every tick carries a [`Frame`]: the host's scaled delta plus, optionally, an
//! unscaled real delta. Jobs that ignore scaled time read the shared
//! [`RealClock`], which advances once per tick no matter how many jobs
//! subscribe, so all of them observe the same delta.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Per-tick time input from the host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Host delta after pause / slow-motion scaling (seconds).
    pub scaled_delta: f32,
    /// Wall-clock delta (seconds). When `None`, the real clock measures it.
    #[serde(default)]
    pub real_delta: Option<f32>,
}

impl Frame {
    pub fn scaled(dt: f32) -> Self {
        Self {
            scaled_delta: dt,
            real_delta: None,
        }
    }

    pub fn new(scaled_delta: f32, real_delta: f32) -> Self {
        Self {
            scaled_delta,
            real_delta: Some(real_delta),
        }
    }
}

/// Clamp host deltas into something the timers can accumulate.
#[inline]
pub(crate) fn sanitize_delta(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.max(0.0)
    } else {
        0.0
    }
}

/// Shared unscaled clock with explicit subscriptions.
///
/// Starts measuring on the first subscription and stops when the last
/// subscriber leaves; while stopped it reports a zero delta and holds no
/// wall-clock reference.
#[derive(Debug, Default)]
pub struct RealClock {
    subscribers: usize,
    last: Option<Instant>,
    delta: f32,
}

impl RealClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) {
        if self.subscribers == 0 {
            // time before the first tick counts
            self.last = Some(Instant::now());
            log::trace!("real clock started");
        }
        self.subscribers += 1;
    }

    pub fn unsubscribe(&mut self) {
        if self.subscribers == 0 {
            return;
        }
        self.subscribers -= 1;
        if self.subscribers == 0 {
            self.last = None;
            self.delta = 0.0;
            log::trace!("real clock stopped");
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.subscribers > 0
    }

    #[inline]
    pub fn subscribers(&self) -> usize {
        self.subscribers
    }

    /// Delta computed by the most recent `advance`.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Compute this tick's real delta once. A host-supplied value wins over
    /// wall-clock measurement.
    pub fn advance(&mut self, supplied: Option<f32>) {
        if !self.is_running() {
            self.delta = 0.0;
            return;
        }
        let now = Instant::now();
        self.delta = match supplied {
            Some(dt) => sanitize_delta(dt),
            None => self
                .last
                .map(|prev| now.duration_since(prev).as_secs_f32())
                .unwrap_or(0.0),
        };
        self.last = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_clock_reports_zero() {
        let mut clock = RealClock::new();
        clock.advance(Some(0.5));
        assert_eq!(clock.delta(), 0.0);
        assert!(!clock.is_running());
    }

    #[test]
    fn supplied_delta_is_shared_by_all_subscribers() {
        let mut clock = RealClock::new();
        clock.subscribe();
        clock.subscribe();
        clock.advance(Some(0.1));
        assert_eq!(clock.delta(), 0.1);
        assert_eq!(clock.subscribers(), 2);
    }

    #[test]
    fn stops_when_last_subscriber_leaves() {
        let mut clock = RealClock::new();
        clock.subscribe();
        clock.advance(Some(0.2));
        clock.unsubscribe();
        assert!(!clock.is_running());
        assert_eq!(clock.delta(), 0.0);
        // extra unsubscribe is ignored
        clock.unsubscribe();
        assert_eq!(clock.subscribers(), 0);
    }

    #[test]
    fn measured_delta_counts_from_subscription() {
        let mut clock = RealClock::new();
        clock.subscribe();
        std::thread::sleep(std::time::Duration::from_millis(20));
        clock.advance(None);
        assert!(clock.delta() >= 0.02, "delta={}", clock.delta());
    }

    #[test]
    fn later_subscribers_do_not_restart_measurement() {
        let mut clock = RealClock::new();
        clock.subscribe();
        std::thread::sleep(std::time::Duration::from_millis(20));
        clock.subscribe();
        clock.advance(None);
        assert!(clock.delta() >= 0.02, "delta={}", clock.delta());
    }

    #[test]
    fn negative_and_nan_deltas_are_zeroed() {
        assert_eq!(sanitize_delta(-1.0), 0.0);
        assert_eq!(sanitize_delta(f32::NAN), 0.0);
        assert_eq!(sanitize_delta(0.25), 0.25);
    }
}
