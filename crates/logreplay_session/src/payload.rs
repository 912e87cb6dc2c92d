// SPDX-License-Identifier: MIT OR Apache-2.0
//! Session configuration payload.
//!
//! The replay server hands the client one JSON blob at session start:
//! the timeline block, one entry per event log (metadata, progress-ring
//! timing, token animations) and the sorted case start-dates used for
//! case-to-case navigation.

use chrono::{DateTime, NaiveDateTime};
use logreplay_clock::TimelineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a session payload.
///
/// All of these are fatal to session initialization.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Payload is not valid JSON or misses required fields
    #[error("malformed session payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A date label could not be parsed
    #[error("unparseable date label {label:?}")]
    BadDateLabel {
        /// The offending label text
        label: String,
    },

    /// Timeline bounds failed validation
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

/// Complete session configuration as sent by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// Timeline block
    pub timeline: TimelinePayload,
    /// One entry per replayed event log
    #[serde(default)]
    pub logs: Vec<LogPayload>,
    /// Case start instants, epoch milliseconds, ascending
    #[serde(default)]
    pub case_dates: Vec<i64>,
}

impl SessionPayload {
    /// Parse a payload from its JSON wire form.
    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Timeline block of the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePayload {
    /// First slot of the replay
    pub start_slot: u32,
    /// Last slot of the replay
    pub end_slot: u32,
    /// Total number of slots on the timeline bar
    pub total_slots: u32,
    /// Engine milliseconds represented by one slot
    pub slot_engine_millis: f64,
    /// Log start date label, RFC 3339 or `YYYY-MM-DD HH:MM:SS`
    pub start_date_label: String,
    /// Log end date label, same formats
    pub end_date_label: String,
}

/// Per-log metadata and animation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPayload {
    /// Source file name of the log
    pub filename: String,
    /// Display color assigned to the log's markers
    pub color: String,
    /// Total number of cases in the log
    pub total: u32,
    /// Cases that could be replayed on the model
    pub play: u32,
    /// Cases replayed with reliable timing
    pub reliable: u32,
    /// Exact trace fitness of the log against the model
    pub exact_trace_fitness: f64,
    /// Timing of the log's progress-ring animation
    pub progress: ProgressPayload,
    /// One moving marker per replayed case
    #[serde(default)]
    pub token_animations: Vec<TokenAnimationPayload>,
}

/// Begin/duration of a log's progress-ring animation, engine seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProgressPayload {
    /// Engine time at which the ring starts filling
    pub begin: f64,
    /// Engine seconds the ring takes to fill
    pub dur: f64,
}

/// Marker path of one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAnimationPayload {
    /// Case identifier from the event log
    pub case_id: String,
    /// Path segments the marker traverses, in order
    #[serde(default)]
    pub path: Vec<PathSegmentPayload>,
}

/// One traversed model element in a marker path, slot units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSegmentPayload {
    /// Model element (node or edge) the marker moves along
    pub element_id: String,
    /// Slot position at which traversal begins
    pub begin_slot: f64,
    /// Traversal length in slots
    pub dur_slots: f64,
}

/// Parse a payload date label into epoch milliseconds.
///
/// RFC 3339 first, then a naive `YYYY-MM-DD HH:MM:SS` form read as UTC.
pub fn parse_date_label(label: &str) -> Result<i64, SessionError> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(label) {
        return Ok(date_time.timestamp_millis());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(label, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc().timestamp_millis());
    }
    Err(SessionError::BadDateLabel {
        label: label.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339_label() {
        assert_eq!(parse_date_label("1970-01-01T00:00:00Z").unwrap(), 0);
        assert_eq!(
            parse_date_label("1970-01-01T01:00:00+01:00").unwrap(),
            0
        );
    }

    #[test]
    fn test_parse_naive_label() {
        assert_eq!(parse_date_label("1970-01-01 00:10:00").unwrap(), 600_000);
    }

    #[test]
    fn test_reject_garbage_label() {
        assert!(matches!(
            parse_date_label("next tuesday"),
            Err(SessionError::BadDateLabel { .. })
        ));
    }

    #[test]
    fn test_payload_round_trips_json() {
        let raw = r##"{
            "timeline": {
                "startSlot": 0,
                "endSlot": 120,
                "totalSlots": 120,
                "slotEngineMillis": 1000.0,
                "startDateLabel": "1970-01-01T00:00:00Z",
                "endDateLabel": "1970-01-01T00:10:00Z"
            },
            "logs": [{
                "filename": "orders.xes",
                "color": "#84c7e3",
                "total": 3,
                "play": 3,
                "reliable": 2,
                "exactTraceFitness": 0.91,
                "progress": { "begin": 0.0, "dur": 120.0 },
                "tokenAnimations": [{
                    "caseId": "case-17",
                    "path": [
                        { "elementId": "flow-1", "beginSlot": 0.0, "durSlots": 10.0 }
                    ]
                }]
            }],
            "caseDates": [1000, 5000, 9000]
        }"##;

        let payload = SessionPayload::from_json(raw).unwrap();
        assert_eq!(payload.timeline.end_slot, 120);
        assert_eq!(payload.logs.len(), 1);
        assert_eq!(payload.logs[0].token_animations[0].case_id, "case-17");
        assert_eq!(payload.case_dates, vec![1000, 5000, 9000]);

        let echoed = serde_json::to_string(&payload).unwrap();
        let reparsed = SessionPayload::from_json(&echoed).unwrap();
        assert_eq!(reparsed.logs[0].filename, "orders.xes");
    }

    #[test]
    fn test_missing_timeline_is_fatal() {
        assert!(matches!(
            SessionPayload::from_json(r#"{ "logs": [] }"#),
            Err(SessionError::Json(_))
        ));
    }
}
