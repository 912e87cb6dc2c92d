// SPDX-License-Identifier: MIT OR Apache-2.0
//! The replay session: validated timeline, per-log summaries, and the
//! marker board the clock refreshes each tick.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use logreplay_clock::{AnimationTiming, MarkerSink, PlaybackClock, Timeline};

use crate::marker::{CaseMarker, MarkerPosition};
use crate::payload::{parse_date_label, SessionError, SessionPayload};

/// Metrics shown for one replayed log.
#[derive(Debug, Clone)]
pub struct LogSummary {
    /// Source file name of the log
    pub filename: String,
    /// Display color assigned to the log
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
    pub progress: AnimationTiming,
}

/// Markers of one log, with their positions as of the last refresh.
#[derive(Debug)]
pub struct LogMarkers {
    /// Source file name of the log
    pub filename: String,
    /// Display color assigned to the log
    pub color: String,
    markers: IndexMap<String, CaseMarker>,
    positions: IndexMap<String, MarkerPosition>,
}

impl LogMarkers {
    /// Markers of this log, in payload order.
    pub fn markers(&self) -> impl Iterator<Item = &CaseMarker> {
        self.markers.values()
    }

    /// Number of cases in this log.
    pub fn case_count(&self) -> usize {
        self.markers.len()
    }

    /// Positions of the markers on the model as of the last refresh.
    ///
    /// Cases not yet spawned or already completed are absent.
    pub fn positions(&self) -> &IndexMap<String, MarkerPosition> {
        &self.positions
    }

    fn refresh_at(&mut self, slot_time: f64) {
        self.positions.clear();
        for (case_id, marker) in &self.markers {
            if let Some(position) = marker.position_at(slot_time) {
                self.positions.insert(case_id.clone(), position);
            }
        }
    }
}

/// All case markers of the session, refreshed by the clock.
#[derive(Debug, Default)]
pub struct MarkerBoard {
    logs: Vec<LogMarkers>,
    last_slot_time: f64,
    last_rate: f64,
}

impl MarkerBoard {
    /// Per-log marker state.
    pub fn logs(&self) -> &[LogMarkers] {
        &self.logs
    }

    /// Slot time of the last refresh.
    pub fn last_slot_time(&self) -> f64 {
        self.last_slot_time
    }

    /// Slots per engine second at the last refresh.
    pub fn last_rate(&self) -> f64 {
        self.last_rate
    }

    fn refresh(&mut self, slot_time: f64, slots_per_engine_second: f64) {
        self.last_slot_time = slot_time;
        self.last_rate = slots_per_engine_second;
        for log in &mut self.logs {
            log.refresh_at(slot_time);
        }
    }
}

/// Shared handle to the [`MarkerBoard`].
///
/// The clock owns its marker sink, so the session and host keep clones of
/// this handle to read positions back. Single-threaded by design.
#[derive(Debug, Clone, Default)]
pub struct SharedMarkerBoard(Rc<RefCell<MarkerBoard>>);

impl SharedMarkerBoard {
    /// Run `f` against the board.
    pub fn with<R>(&self, f: impl FnOnce(&MarkerBoard) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Slot time of the last refresh.
    pub fn last_slot_time(&self) -> f64 {
        self.0.borrow().last_slot_time()
    }

    /// Total number of markers currently visible on the model.
    pub fn visible_markers(&self) -> usize {
        self.0
            .borrow()
            .logs()
            .iter()
            .map(|log| log.positions().len())
            .sum()
    }
}

impl MarkerSink for SharedMarkerBoard {
    fn refresh(&mut self, slot_time: f64, slots_per_engine_second: f64) {
        self.0.borrow_mut().refresh(slot_time, slots_per_engine_second);
    }
}

/// A fully-loaded replay session.
///
/// Owns everything the hosting application needs: the validated timeline,
/// sorted case dates, per-log summaries, and the marker board.
#[derive(Debug)]
pub struct ReplaySession {
    timeline: Timeline,
    case_dates: Vec<i64>,
    logs: Vec<LogSummary>,
    board: SharedMarkerBoard,
}

impl ReplaySession {
    /// Build a session from the server payload.
    ///
    /// Fails on unparseable date labels or invalid timeline bounds. Case
    /// dates arriving out of order are sorted here so navigation can rely
    /// on ascending order.
    pub fn from_payload(payload: &SessionPayload) -> Result<Self, SessionError> {
        let start_date_millis = parse_date_label(&payload.timeline.start_date_label)?;
        let end_date_millis = parse_date_label(&payload.timeline.end_date_label)?;

        let timeline = Timeline::new(
            payload.timeline.start_slot,
            payload.timeline.end_slot,
            payload.timeline.total_slots,
            payload.timeline.slot_engine_millis,
            start_date_millis,
            end_date_millis,
        )?;

        let mut case_dates = payload.case_dates.clone();
        if !case_dates.windows(2).all(|pair| pair[0] <= pair[1]) {
            tracing::warn!("case dates arrived unsorted, sorting");
            case_dates.sort_unstable();
        }

        let mut logs = Vec::with_capacity(payload.logs.len());
        let mut board = MarkerBoard::default();
        for log in &payload.logs {
            logs.push(LogSummary {
                filename: log.filename.clone(),
                color: log.color.clone(),
                total: log.total,
                play: log.play,
                reliable: log.reliable,
                exact_trace_fitness: log.exact_trace_fitness,
                progress: AnimationTiming {
                    begin: log.progress.begin,
                    dur: log.progress.dur,
                },
            });

            let markers: IndexMap<String, CaseMarker> = log
                .token_animations
                .iter()
                .map(|animation| {
                    (
                        animation.case_id.clone(),
                        CaseMarker::from_payload(animation),
                    )
                })
                .collect();
            board.logs.push(LogMarkers {
                filename: log.filename.clone(),
                color: log.color.clone(),
                markers,
                positions: IndexMap::new(),
            });
        }

        tracing::info!(
            logs = logs.len(),
            cases = case_dates.len(),
            "replay session loaded"
        );

        Ok(Self {
            timeline,
            case_dates,
            logs,
            board: SharedMarkerBoard(Rc::new(RefCell::new(board))),
        })
    }

    /// The validated timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Case start instants, ascending.
    pub fn case_dates(&self) -> &[i64] {
        &self.case_dates
    }

    /// Per-log metrics.
    pub fn logs(&self) -> &[LogSummary] {
        &self.logs
    }

    /// Handle to the marker board.
    pub fn marker_board(&self) -> SharedMarkerBoard {
        self.board.clone()
    }

    /// Build a playback clock wired to this session's marker board.
    ///
    /// The host still registers its rendering surfaces and display sink.
    pub fn build_clock(&self) -> PlaybackClock {
        let mut clock = PlaybackClock::new(self.timeline.clone(), self.case_dates.clone());
        clock.set_marker_sink(Box::new(self.board.clone()));
        clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{
        LogPayload, PathSegmentPayload, ProgressPayload, TimelinePayload, TokenAnimationPayload,
    };
    use logreplay_clock::TimelineError;

    fn payload() -> SessionPayload {
        SessionPayload {
            timeline: TimelinePayload {
                start_slot: 0,
                end_slot: 120,
                total_slots: 120,
                slot_engine_millis: 1000.0,
                start_date_label: "1970-01-01T00:00:00Z".to_string(),
                end_date_label: "1970-01-01T00:10:00Z".to_string(),
            },
            logs: vec![LogPayload {
                filename: "orders.xes".to_string(),
                color: "#84c7e3".to_string(),
                total: 2,
                play: 2,
                reliable: 2,
                exact_trace_fitness: 1.0,
                progress: ProgressPayload {
                    begin: 0.0,
                    dur: 120.0,
                },
                token_animations: vec![TokenAnimationPayload {
                    case_id: "case-1".to_string(),
                    path: vec![PathSegmentPayload {
                        element_id: "edge-a".to_string(),
                        begin_slot: 10.0,
                        dur_slots: 20.0,
                    }],
                }],
            }],
            case_dates: vec![9000, 1000, 5000],
        }
    }

    #[test]
    fn test_session_sorts_case_dates() {
        let session = ReplaySession::from_payload(&payload()).unwrap();
        assert_eq!(session.case_dates(), &[1000, 5000, 9000]);
    }

    #[test]
    fn test_session_builds_timeline() {
        let session = ReplaySession::from_payload(&payload()).unwrap();
        assert_eq!(session.timeline().end_date_millis(), 600_000);
        assert_eq!(session.timeline().time_coefficient(), 5.0);
        assert_eq!(session.logs()[0].progress.dur, 120.0);
    }

    #[test]
    fn test_bad_timeline_bounds_are_fatal() {
        let mut bad = payload();
        bad.timeline.end_slot = 0;
        assert!(matches!(
            ReplaySession::from_payload(&bad),
            Err(SessionError::Timeline(TimelineError::SlotOrder { .. }))
        ));
    }

    #[test]
    fn test_bad_date_label_is_fatal() {
        let mut bad = payload();
        bad.timeline.start_date_label = "not a date".to_string();
        assert!(matches!(
            ReplaySession::from_payload(&bad),
            Err(SessionError::BadDateLabel { .. })
        ));
    }

    #[test]
    fn test_clock_refreshes_marker_board() {
        let session = ReplaySession::from_payload(&payload()).unwrap();
        let board = session.marker_board();
        let mut clock = session.build_clock();

        // Slot 20 sits inside case-1's only segment
        clock.set_time(20.0, false);
        assert_eq!(board.last_slot_time(), 20.0);
        assert_eq!(board.visible_markers(), 1);
        board.with(|b| {
            let position = &b.logs()[0].positions()["case-1"];
            assert_eq!(position.element_id, "edge-a");
            assert_eq!(position.fraction, 0.5);
        });

        // Before the case spawns the model is empty
        clock.set_time(0.0, false);
        assert_eq!(board.visible_markers(), 0);
    }

    #[test]
    fn test_marker_positions_survive_speed_change() {
        let session = ReplaySession::from_payload(&payload()).unwrap();
        let board = session.marker_board();
        let mut clock = session.build_clock();

        clock.set_time(20.0, false);
        let before = board.with(|b| b.logs()[0].positions()["case-1"].clone());

        clock.change_speed(4.0);
        clock.tick();
        let after = board.with(|b| b.logs()[0].positions()["case-1"].clone());
        assert_eq!(before, after);
    }
}
