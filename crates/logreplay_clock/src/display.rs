// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wall-clock display formatting.

use chrono::{DateTime, Utc};

/// Formatted date and time strings for the digital clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInstant {
    /// Date portion, e.g. `02 Mar 2020`
    pub date: String,
    /// Time portion, e.g. `14:05:09`
    pub time: String,
}

/// Sink for the digital clock readout.
///
/// Receives pre-formatted strings whenever the clock recomputes the
/// displayed instant.
pub trait WallClockDisplay {
    /// Show a new instant on the digital clock.
    fn show(&mut self, instant: DisplayInstant);
}

/// Format a wall-clock instant for the digital clock.
///
/// Instants outside the representable date range degrade to a raw
/// millisecond readout instead of failing.
pub fn format_instant(data_millis: f64) -> DisplayInstant {
    let rounded = data_millis.round();
    let representable = rounded.is_finite()
        && rounded >= i64::MIN as f64
        && rounded <= i64::MAX as f64;

    if representable {
        if let Some(date_time) = DateTime::<Utc>::from_timestamp_millis(rounded as i64) {
            return DisplayInstant {
                date: date_time.format("%d %b %Y").to_string(),
                time: date_time.format("%H:%M:%S").to_string(),
            };
        }
    }

    DisplayInstant {
        date: format!("{data_millis} ms"),
        time: "--:--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_epoch() {
        let instant = format_instant(0.0);
        assert_eq!(instant.date, "01 Jan 1970");
        assert_eq!(instant.time, "00:00:00");
    }

    #[test]
    fn test_format_five_minutes_in() {
        let instant = format_instant(300_000.0);
        assert_eq!(instant.time, "00:05:00");
    }

    #[test]
    fn test_fallback_for_unrepresentable_instant() {
        let instant = format_instant(f64::MAX);
        assert!(instant.date.ends_with(" ms"));
        assert_eq!(instant.time, "--:--:--");
    }
}
