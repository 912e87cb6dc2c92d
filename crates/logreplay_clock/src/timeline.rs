// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline configuration and time-domain conversions.
//!
//! The replay engine runs three time domains at once:
//! - engine time: seconds on the rendering surface's own clock
//! - data time: wall-clock milliseconds recorded in the event log
//! - slot position: the timeline bar divided into equal slots
//!
//! `Timeline` holds the per-session configuration and all conversions
//! between the three domains. Derived rates are computed on demand so a
//! rate change (which rescales `slot_engine_millis`) can never leave a
//! cached coefficient stale.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating timeline configuration.
///
/// All of these are fatal to session initialization.
#[derive(Debug, Clone, Error)]
pub enum TimelineError {
    /// End slot does not come after the start slot
    #[error("end slot {end} must be greater than start slot {start}")]
    SlotOrder {
        /// Configured start slot
        start: u32,
        /// Configured end slot
        end: u32,
    },

    /// Engine milliseconds per slot is zero, negative, or not finite
    #[error("slot engine milliseconds must be positive and finite, got {0}")]
    InvalidSlotEngineMillis(f64),

    /// End date precedes the start date
    #[error("end date {end} ms precedes start date {start} ms")]
    DateOrder {
        /// Log start date, epoch milliseconds
        start: i64,
        /// Log end date, epoch milliseconds
        end: i64,
    },
}

/// Per-session timeline configuration.
///
/// Immutable after construction except for `slot_engine_millis`, which a
/// rate change divides by the speed ratio (the timeline bar keeps the same
/// slot count but each slot spans less engine time at higher speed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// First slot of the replay, usually 0
    start_slot: u32,
    /// Last slot of the replay
    end_slot: u32,
    /// Total number of slots on the timeline bar
    total_slots: u32,
    /// Engine milliseconds represented by one slot
    slot_engine_millis: f64,
    /// Log start date, epoch milliseconds
    start_date_millis: i64,
    /// Log end date, epoch milliseconds
    end_date_millis: i64,
}

impl Timeline {
    /// Create a validated timeline.
    ///
    /// Returns an error when the slot range is empty or reversed, the slot
    /// engine duration is not a positive finite number, or the date range
    /// is reversed. A zero-length date range is allowed and yields a time
    /// coefficient of zero.
    pub fn new(
        start_slot: u32,
        end_slot: u32,
        total_slots: u32,
        slot_engine_millis: f64,
        start_date_millis: i64,
        end_date_millis: i64,
    ) -> Result<Self, TimelineError> {
        if end_slot <= start_slot {
            return Err(TimelineError::SlotOrder {
                start: start_slot,
                end: end_slot,
            });
        }
        if !slot_engine_millis.is_finite() || slot_engine_millis <= 0.0 {
            return Err(TimelineError::InvalidSlotEngineMillis(slot_engine_millis));
        }
        if end_date_millis < start_date_millis {
            return Err(TimelineError::DateOrder {
                start: start_date_millis,
                end: end_date_millis,
            });
        }

        Ok(Self {
            start_slot,
            end_slot,
            total_slots,
            slot_engine_millis,
            start_date_millis,
            end_date_millis,
        })
    }

    /// First slot of the replay
    pub fn start_slot(&self) -> u32 {
        self.start_slot
    }

    /// Last slot of the replay
    pub fn end_slot(&self) -> u32 {
        self.end_slot
    }

    /// Total number of slots on the timeline bar
    pub fn total_slots(&self) -> u32 {
        self.total_slots
    }

    /// Engine milliseconds represented by one slot at the current rate
    pub fn slot_engine_millis(&self) -> f64 {
        self.slot_engine_millis
    }

    /// Log start date, epoch milliseconds
    pub fn start_date_millis(&self) -> i64 {
        self.start_date_millis
    }

    /// Log end date, epoch milliseconds
    pub fn end_date_millis(&self) -> i64 {
        self.end_date_millis
    }

    /// Data milliseconds represented by one slot.
    ///
    /// Independent of the playback rate.
    pub fn data_millis_per_slot(&self) -> f64 {
        (self.end_date_millis - self.start_date_millis) as f64
            / f64::from(self.end_slot - self.start_slot)
    }

    /// Data milliseconds represented by one engine millisecond.
    pub fn time_coefficient(&self) -> f64 {
        self.data_millis_per_slot() / self.slot_engine_millis
    }

    /// Slots traversed per engine second at the current rate.
    pub fn slots_per_engine_second(&self) -> f64 {
        1000.0 / self.slot_engine_millis
    }

    /// Engine seconds at a given slot position.
    pub fn slot_to_engine_seconds(&self, slot: f64) -> f64 {
        slot * self.slot_engine_millis / 1000.0
    }

    /// Engine seconds of the start-slot boundary.
    pub fn start_engine_seconds(&self) -> f64 {
        self.slot_to_engine_seconds(f64::from(self.start_slot))
    }

    /// Engine seconds of the end-slot boundary.
    pub fn end_engine_seconds(&self) -> f64 {
        self.slot_to_engine_seconds(f64::from(self.end_slot))
    }

    /// Wall-clock instant (epoch milliseconds) shown at an engine time.
    pub fn engine_seconds_to_data_millis(&self, engine_seconds: f64) -> f64 {
        engine_seconds * self.time_coefficient() * 1000.0 + self.start_date_millis as f64
    }

    /// Engine time at which a wall-clock instant is shown.
    ///
    /// Inverse of [`Self::engine_seconds_to_data_millis`]. With a zero-length
    /// date range every instant maps to the start boundary.
    pub fn data_millis_to_engine_seconds(&self, data_millis: f64) -> f64 {
        let coefficient = self.time_coefficient();
        if coefficient == 0.0 {
            return self.start_engine_seconds();
        }
        (data_millis - self.start_date_millis as f64) / (1000.0 * coefficient)
    }

    /// Clamp a wall-clock instant to the configured date range.
    pub fn clamp_data_millis(&self, data_millis: i64) -> i64 {
        data_millis.clamp(self.start_date_millis, self.end_date_millis)
    }

    /// Divide the engine span of one slot by a speed ratio.
    ///
    /// The caller has already validated the ratio.
    pub(crate) fn scale_rate(&mut self, speed_ratio: f64) {
        self.slot_engine_millis /= speed_ratio;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_minute_timeline() -> Timeline {
        // 10 minutes of data over 120 slots of 1 engine-second each
        Timeline::new(0, 120, 120, 1000.0, 0, 600_000).unwrap()
    }

    #[test]
    fn test_derived_rates() {
        let timeline = ten_minute_timeline();
        assert_eq!(timeline.data_millis_per_slot(), 5000.0);
        assert_eq!(timeline.time_coefficient(), 5.0);
    }

    #[test]
    fn test_displayed_wall_time() {
        let timeline = ten_minute_timeline();
        assert_eq!(timeline.engine_seconds_to_data_millis(60.0), 300_000.0);
    }

    #[test]
    fn test_date_engine_round_trip() {
        let timeline = ten_minute_timeline();
        let engine = timeline.data_millis_to_engine_seconds(300_000.0);
        assert_eq!(engine, 60.0);
        assert_eq!(timeline.engine_seconds_to_data_millis(engine), 300_000.0);
    }

    #[test]
    fn test_rejects_reversed_slots() {
        assert!(matches!(
            Timeline::new(120, 0, 120, 1000.0, 0, 600_000),
            Err(TimelineError::SlotOrder { .. })
        ));
        assert!(matches!(
            Timeline::new(5, 5, 120, 1000.0, 0, 600_000),
            Err(TimelineError::SlotOrder { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_slot_engine_millis() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Timeline::new(0, 120, 120, bad, 0, 600_000),
                Err(TimelineError::InvalidSlotEngineMillis(_))
            ));
        }
    }

    #[test]
    fn test_rejects_reversed_dates() {
        assert!(matches!(
            Timeline::new(0, 120, 120, 1000.0, 600_000, 0),
            Err(TimelineError::DateOrder { .. })
        ));
    }

    #[test]
    fn test_scale_rate_shrinks_slot_span() {
        let mut timeline = ten_minute_timeline();
        timeline.scale_rate(2.0);
        assert_eq!(timeline.slot_engine_millis(), 500.0);
        assert_eq!(timeline.time_coefficient(), 10.0);
        // The data side of each slot never changes with speed
        assert_eq!(timeline.data_millis_per_slot(), 5000.0);
    }

    #[test]
    fn test_clamp_data_millis() {
        let timeline = ten_minute_timeline();
        assert_eq!(timeline.clamp_data_millis(-5), 0);
        assert_eq!(timeline.clamp_data_millis(700_000), 600_000);
        assert_eq!(timeline.clamp_data_millis(42), 42);
    }
}
