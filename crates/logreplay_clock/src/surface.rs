// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rendering surface abstraction.
//!
//! Every independently-timed animated surface (the process model, the
//! timeline bar, each progress ring) carries its own time cursor. The clock
//! drives all registered surfaces to the same cursor value, so any concrete
//! renderer works here as long as it honours the cursor contract. The
//! [`HeadlessSurface`] double is used by tests and the headless player.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a registered rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub Uuid);

impl SurfaceId {
    /// Create a new random surface ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

/// An animated surface with its own time cursor.
pub trait RenderingSurface {
    /// Move the surface's time cursor to `engine_seconds`.
    fn set_cursor_time(&mut self, engine_seconds: f64);

    /// Read the surface's current time cursor.
    fn get_cursor_time(&self) -> f64;

    /// Freeze all animations on this surface.
    fn pause_all(&mut self);

    /// Resume all animations on this surface from the current cursor.
    fn resume_all(&mut self);

    /// Scale the stored begin/duration of every in-flight animation.
    ///
    /// Called during a rate change with factor `1 / speed_ratio` so that
    /// per-element timing stays consistent with the remapped cursor.
    /// Surfaces without stored per-element timing can ignore this.
    fn scale_timing(&mut self, factor: f64) {
        let _ = factor;
    }
}

/// Stored begin/duration of one in-flight animation, engine seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationTiming {
    /// Engine time at which the animation begins
    pub begin: f64,
    /// Engine seconds the animation runs for
    pub dur: f64,
}

impl AnimationTiming {
    /// Fraction of this animation completed at a cursor position, clamped
    /// to `[0, 1]`.
    pub fn progress_at(&self, cursor: f64) -> f64 {
        if self.dur <= 0.0 {
            return 1.0;
        }
        ((cursor - self.begin) / self.dur).clamp(0.0, 1.0)
    }

    fn scale(&mut self, factor: f64) {
        self.begin *= factor;
        self.dur *= factor;
    }
}

/// In-memory rendering surface for tests and headless playback.
///
/// The cursor only moves when the host advances it or the clock seeks it;
/// there is no background engine.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    cursor: f64,
    running: bool,
    timings: Vec<AnimationTiming>,
}

impl HeadlessSurface {
    /// Create a surface with the cursor at zero, paused.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach stored animation timings to the surface.
    pub fn with_timings(mut self, timings: Vec<AnimationTiming>) -> Self {
        self.timings = timings;
        self
    }

    /// Advance the cursor by `engine_seconds` if the surface is running.
    pub fn advance(&mut self, engine_seconds: f64) {
        if self.running {
            self.cursor += engine_seconds;
        }
    }

    /// Whether animations are currently running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stored animation timings.
    pub fn timings(&self) -> &[AnimationTiming] {
        &self.timings
    }
}

impl RenderingSurface for HeadlessSurface {
    fn set_cursor_time(&mut self, engine_seconds: f64) {
        self.cursor = engine_seconds;
    }

    fn get_cursor_time(&self) -> f64 {
        self.cursor
    }

    fn pause_all(&mut self) {
        self.running = false;
    }

    fn resume_all(&mut self) {
        self.running = true;
    }

    fn scale_timing(&mut self, factor: f64) {
        for timing in &mut self.timings {
            timing.scale(factor);
        }
    }
}

/// Shared handle to a [`HeadlessSurface`].
///
/// The clock owns its registered surfaces, so a host that also needs to
/// advance or inspect a headless surface keeps a clone of this handle.
/// Single-threaded by design, matching the cooperative cadence model.
#[derive(Debug, Clone, Default)]
pub struct SharedSurface(Rc<RefCell<HeadlessSurface>>);

impl SharedSurface {
    /// Wrap a surface in a shared handle.
    pub fn new(surface: HeadlessSurface) -> Self {
        Self(Rc::new(RefCell::new(surface)))
    }

    /// Advance the cursor by `engine_seconds` if running.
    pub fn advance(&self, engine_seconds: f64) {
        self.0.borrow_mut().advance(engine_seconds);
    }

    /// Read the cursor.
    pub fn cursor(&self) -> f64 {
        self.0.borrow().get_cursor_time()
    }

    /// Whether animations are currently running.
    pub fn is_running(&self) -> bool {
        self.0.borrow().is_running()
    }

    /// Snapshot of the stored animation timings.
    pub fn timings(&self) -> Vec<AnimationTiming> {
        self.0.borrow().timings().to_vec()
    }
}

impl RenderingSurface for SharedSurface {
    fn set_cursor_time(&mut self, engine_seconds: f64) {
        self.0.borrow_mut().set_cursor_time(engine_seconds);
    }

    fn get_cursor_time(&self) -> f64 {
        self.0.borrow().get_cursor_time()
    }

    fn pause_all(&mut self) {
        self.0.borrow_mut().pause_all();
    }

    fn resume_all(&mut self) {
        self.0.borrow_mut().resume_all();
    }

    fn scale_timing(&mut self, factor: f64) {
        self.0.borrow_mut().scale_timing(factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_only_while_running() {
        let mut surface = HeadlessSurface::new();
        surface.advance(1.0);
        assert_eq!(surface.get_cursor_time(), 0.0);

        surface.resume_all();
        surface.advance(1.5);
        assert_eq!(surface.get_cursor_time(), 1.5);

        surface.pause_all();
        surface.advance(1.0);
        assert_eq!(surface.get_cursor_time(), 1.5);
    }

    #[test]
    fn test_scale_timing_preserves_progress() {
        let timing = AnimationTiming { begin: 2.0, dur: 8.0 };
        let mut surface = HeadlessSurface::new().with_timings(vec![timing]);
        surface.set_cursor_time(6.0);
        let before = surface.timings()[0].progress_at(surface.get_cursor_time());

        // Double speed: timings and cursor both shrink by half
        surface.scale_timing(0.5);
        surface.set_cursor_time(3.0);
        let after = surface.timings()[0].progress_at(surface.get_cursor_time());
        assert_eq!(before, after);
    }

    #[test]
    fn test_progress_clamps() {
        let timing = AnimationTiming { begin: 5.0, dur: 10.0 };
        assert_eq!(timing.progress_at(0.0), 0.0);
        assert_eq!(timing.progress_at(10.0), 0.5);
        assert_eq!(timing.progress_at(100.0), 1.0);
    }

    #[test]
    fn test_shared_handle_sees_clock_writes() {
        let shared = SharedSurface::new(HeadlessSurface::new());
        let mut registered = shared.clone();
        registered.set_cursor_time(12.5);
        assert_eq!(shared.cursor(), 12.5);
    }
}
