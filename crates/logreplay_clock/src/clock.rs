// SPDX-License-Identifier: MIT OR Apache-2.0
//! The playback clock: playback state, time-domain translation, and
//! seek/rate commands to the registered rendering surfaces.

use crate::cadence::TickCadence;
use crate::display::{format_instant, WallClockDisplay};
use crate::surface::{RenderingSurface, SurfaceId};
use crate::timeline::Timeline;

/// Playback phase of the replay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockPhase {
    /// Configured but no playback command issued yet
    #[default]
    Stopped,
    /// Animations running, cadence ticking
    Playing,
    /// Animations frozen at the current position
    Paused,
    /// Replay ran past the end slot; only a seek or `start` leaves this
    Ended,
}

/// Mutable playback record, single writer.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackState {
    /// Last engine time commanded to the surfaces, seconds.
    ///
    /// The surfaces' own cursor stays authoritative for reads; this field
    /// is a record of the last command, not a cache.
    pub engine_time_seconds: f64,
    /// Effective speed multiplier accumulated over rate changes
    pub speed_ratio: f64,
    /// Current phase
    pub phase: ClockPhase,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            engine_time_seconds: 0.0,
            speed_ratio: 1.0,
            phase: ClockPhase::Stopped,
        }
    }
}

impl PlaybackState {
    /// Whether playback is currently paused.
    pub fn is_paused(&self) -> bool {
        self.phase == ClockPhase::Paused
    }
}

/// Direction for case-to-case navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDirection {
    /// Nearest case strictly after the current instant
    Forward,
    /// Nearest case strictly before the current instant
    Backward,
}

/// Receiver of marker refreshes.
///
/// Case markers are a rendering concern owned by the session; the clock
/// only supplies the slot time and the slot rate on each refresh.
pub trait MarkerSink {
    /// Recompute marker positions for `slot_time` (slots from the timeline
    /// origin) at the given rate (slots per engine second).
    fn refresh(&mut self, slot_time: f64, slots_per_engine_second: f64);
}

/// Owns playback state and drives the rendering surfaces.
///
/// Single-threaded by contract: all mutation happens on the one
/// caller/callback thread, and the tick cadence holds at most one live
/// registration (see [`TickCadence`]).
pub struct PlaybackClock {
    timeline: Timeline,
    state: PlaybackState,
    cadence: TickCadence,
    surfaces: Vec<(SurfaceId, Box<dyn RenderingSurface>)>,
    markers: Option<Box<dyn MarkerSink>>,
    display: Option<Box<dyn WallClockDisplay>>,
    case_dates: Vec<i64>,
}

impl PlaybackClock {
    /// Create a clock for a validated timeline.
    ///
    /// `case_dates` are the case start instants (epoch milliseconds),
    /// sorted ascending by the session loader.
    pub fn new(timeline: Timeline, case_dates: Vec<i64>) -> Self {
        Self {
            timeline,
            state: PlaybackState::default(),
            cadence: TickCadence::new(),
            surfaces: Vec::new(),
            markers: None,
            display: None,
            case_dates,
        }
    }

    /// Register an animated surface. All registered surfaces are driven to
    /// the same cursor value on every seek.
    pub fn register_surface(&mut self, surface: Box<dyn RenderingSurface>) -> SurfaceId {
        let id = SurfaceId::new();
        self.surfaces.push((id, surface));
        id
    }

    /// Attach the marker sink refreshed on every tick and seek.
    pub fn set_marker_sink(&mut self, sink: Box<dyn MarkerSink>) {
        self.markers = Some(sink);
    }

    /// Attach the digital clock readout sink.
    pub fn set_display(&mut self, display: Box<dyn WallClockDisplay>) {
        self.display = Some(display);
    }

    /// Timeline configuration at the current rate.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Current playback record.
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> ClockPhase {
        self.state.phase
    }

    /// Whether the tick cadence is live.
    pub fn is_ticking(&self) -> bool {
        self.cadence.is_active()
    }

    /// Tick cadence bookkeeping.
    pub fn cadence(&self) -> &TickCadence {
        &self.cadence
    }

    /// Current engine time, seconds.
    ///
    /// Reads the first registered surface's cursor; the renderer is the
    /// source of truth for position. Falls back to the last commanded time
    /// when no surface is registered.
    pub fn get_time(&self) -> f64 {
        self.surfaces
            .first()
            .map_or(self.state.engine_time_seconds, |(_, s)| s.get_cursor_time())
    }

    /// Command every surface's cursor to `engine_seconds`.
    ///
    /// Performs no clamping. Unless `rate_change` is set, also refreshes
    /// the markers and the digital clock for the new instant; the
    /// rate-change path suppresses both and performs its own refresh.
    pub fn set_time(&mut self, engine_seconds: f64, rate_change: bool) {
        for (_, surface) in &mut self.surfaces {
            surface.set_cursor_time(engine_seconds);
        }
        self.state.engine_time_seconds = engine_seconds;

        if !rate_change {
            self.refresh_markers();
            self.refresh_display(engine_seconds);
        }
    }

    /// Periodic cadence callback, fired every 100 ms while playing.
    ///
    /// Refreshes markers, detects the end of the replay, and otherwise
    /// updates the digital clock. Must not loop back into itself via
    /// [`Self::end`], which is why `end` stops the cadence.
    pub fn tick(&mut self) {
        if self.state.phase == ClockPhase::Ended {
            return;
        }

        self.refresh_markers();

        let now = self.get_time();
        if now > self.timeline.end_engine_seconds() {
            self.end();
        } else {
            self.refresh_display(now);
        }
    }

    /// Change the playback rate, preserving every marker's progress.
    ///
    /// With `Cx` the engine time before the change, the cursor is remapped
    /// to `Cx / speed_ratio` while all stored animation timings scale by
    /// the same factor, so rendered positions are unchanged across the
    /// call. Non-finite or non-positive ratios are rejected without
    /// touching any state.
    pub fn change_speed(&mut self, speed_ratio: f64) {
        if !speed_ratio.is_finite() || speed_ratio <= 0.0 {
            tracing::warn!(speed_ratio, "rejecting invalid speed ratio");
            return;
        }

        let factor = 1.0 / speed_ratio;
        for (_, surface) in &mut self.surfaces {
            surface.scale_timing(factor);
        }

        self.timeline.scale_rate(speed_ratio);
        self.state.speed_ratio *= speed_ratio;

        // One refresh at the pre-remap cursor, then remap it without a
        // second marker/clock update.
        self.refresh_markers();
        let remapped = self.get_time() / speed_ratio;
        self.set_time(remapped, true);

        tracing::debug!(
            speed_ratio = self.state.speed_ratio,
            engine_seconds = remapped,
            "playback rate changed"
        );
    }

    /// Move forward by exactly one slot; silent no-op at the end slot.
    pub fn step_forward(&mut self) {
        if self.get_time() >= self.timeline.end_engine_seconds() {
            return;
        }
        let target = self.get_time() + self.timeline.slot_engine_millis() / 1000.0;
        self.set_time(target, false);
        self.leave_ended();
    }

    /// Move backward by exactly one slot; silent no-op at the start slot.
    pub fn step_backward(&mut self) {
        if self.get_time() <= self.timeline.start_engine_seconds() {
            return;
        }
        let target = self.get_time() - self.timeline.slot_engine_millis() / 1000.0;
        self.set_time(target, false);
        self.leave_ended();
    }

    /// Seek to the nearest case start strictly after or strictly before
    /// the current wall-clock instant.
    ///
    /// A case starting exactly at the current instant never counts as
    /// adjacent, in either direction. No-op when no such case exists or
    /// when already at the relevant boundary.
    pub fn seek_to_adjacent_case(&mut self, direction: SeekDirection) {
        let now_millis = self
            .timeline
            .engine_seconds_to_data_millis(self.get_time());

        let target = match direction {
            SeekDirection::Forward => {
                if self.get_time() >= self.timeline.end_engine_seconds() {
                    return;
                }
                self.case_dates
                    .iter()
                    .copied()
                    .find(|&date| (date as f64) > now_millis)
            }
            SeekDirection::Backward => {
                if self.get_time() <= self.timeline.start_engine_seconds() {
                    return;
                }
                self.case_dates
                    .iter()
                    .rev()
                    .copied()
                    .find(|&date| (date as f64) < now_millis)
            }
        };

        if let Some(date) = target {
            let engine = self.timeline.data_millis_to_engine_seconds(date as f64);
            self.set_time(engine, false);
            self.leave_ended();
        }
    }

    /// Seek to a wall-clock instant, clamped to the configured date range.
    pub fn seek_to_date(&mut self, data_millis: i64) {
        let clamped = self.timeline.clamp_data_millis(data_millis);
        let engine = self.timeline.data_millis_to_engine_seconds(clamped as f64);
        self.set_time(engine, false);
        self.leave_ended();
    }

    /// Pause, then seek to the start-slot boundary.
    pub fn start(&mut self) {
        self.pause();
        self.set_time(self.timeline.start_engine_seconds(), false);
        self.leave_ended();
    }

    /// Finish the replay: pause, snap to the end-slot boundary, push one
    /// final clock readout, and stop the cadence. Enters [`ClockPhase::Ended`].
    pub fn end(&mut self) {
        self.pause();
        let end_seconds = self.timeline.end_engine_seconds();
        self.set_time(end_seconds, false);
        self.refresh_display(end_seconds);
        self.cadence.stop();
        self.state.phase = ClockPhase::Ended;
        tracing::debug!("replay ended");
    }

    /// Stop the cadence and freeze all surface animations.
    pub fn pause(&mut self) {
        self.cadence.stop();
        for (_, surface) in &mut self.surfaces {
            surface.pause_all();
        }
        if self.state.phase != ClockPhase::Ended {
            self.state.phase = ClockPhase::Paused;
        }
    }

    /// Restart the cadence and all surface animations from the current
    /// position. Refused in the Ended phase; only a seek or [`Self::start`]
    /// may resume ticking from there.
    pub fn resume(&mut self) {
        if self.state.phase == ClockPhase::Ended {
            tracing::warn!("resume refused after end of replay");
            return;
        }
        for (_, surface) in &mut self.surfaces {
            surface.resume_all();
        }
        self.cadence.start();
        self.state.phase = ClockPhase::Playing;
    }

    fn leave_ended(&mut self) {
        if self.state.phase == ClockPhase::Ended {
            self.state.phase = ClockPhase::Paused;
        }
    }

    fn refresh_markers(&mut self) {
        if let Some(sink) = self.markers.as_mut() {
            let rate = self.timeline.slots_per_engine_second();
            let slot_time = self
                .surfaces
                .first()
                .map_or(self.state.engine_time_seconds, |(_, s)| s.get_cursor_time())
                * rate;
            sink.refresh(slot_time, rate);
        }
    }

    fn refresh_display(&mut self, engine_seconds: f64) {
        if let Some(display) = self.display.as_mut() {
            let instant = self.timeline.engine_seconds_to_data_millis(engine_seconds);
            display.show(format_instant(instant));
        }
    }
}
