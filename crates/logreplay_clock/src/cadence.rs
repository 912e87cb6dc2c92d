// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tick cadence bookkeeping.
//!
//! The clock is driven by one periodic external callback. `TickCadence`
//! records whether a registration is live so the host knows when to keep
//! calling [`PlaybackClock::tick`](crate::PlaybackClock::tick). At most one
//! registration exists at a time: starting always cancels the previous one
//! first, and stopping twice is a no-op.

use std::time::Duration;

/// Interval between tick callbacks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// State of the single periodic tick registration.
#[derive(Debug, Default)]
pub struct TickCadence {
    active: bool,
    generation: u64,
}

impl TickCadence {
    /// Create a cadence with no active registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the periodic callback, cancelling any previous registration.
    pub fn start(&mut self) {
        if self.active {
            self.cancel();
        }
        self.active = true;
        self.generation += 1;
    }

    /// Cancel the registration. Idempotent.
    pub fn stop(&mut self) {
        if self.active {
            self.cancel();
        }
    }

    fn cancel(&mut self) {
        self.active = false;
    }

    /// Whether a registration is live and ticks should keep firing.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// How many registrations have been made over the session.
    ///
    /// Each start counts once, confirming restarts replace rather than
    /// stack registrations.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Interval at which the host should invoke the tick callback.
    pub fn interval(&self) -> Duration {
        TICK_INTERVAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_replaces_previous_registration() {
        let mut cadence = TickCadence::new();
        cadence.start();
        cadence.start();
        assert!(cadence.is_active());
        assert_eq!(cadence.generation(), 2);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut cadence = TickCadence::new();
        cadence.start();
        cadence.stop();
        cadence.stop();
        assert!(!cadence.is_active());
        assert_eq!(cadence.generation(), 1);
    }

    #[test]
    fn test_restart_after_stop() {
        let mut cadence = TickCadence::new();
        cadence.start();
        cadence.stop();
        cadence.start();
        assert!(cadence.is_active());
        assert_eq!(cadence.interval(), Duration::from_millis(100));
    }
}
