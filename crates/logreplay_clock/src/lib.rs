// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback clock for event-log replay.
//!
//! This crate provides the timing core of a replay session:
//! - Timeline configuration and time-domain conversion
//! - Playback state machine with seek and rate-change commands
//! - Rendering-surface abstraction driven to a common time cursor
//! - Tick cadence bookkeeping and wall-clock display formatting
//!
//! ## Architecture
//!
//! A replay runs in three time domains: engine seconds on the rendering
//! surfaces, wall-clock milliseconds in the event log, and slot positions
//! on the timeline bar. [`Timeline`] converts between them;
//! [`PlaybackClock`] owns the playback state and issues idempotent
//! seek/rate commands to every registered [`RenderingSurface`]. The clock
//! is single-threaded and cooperative, driven by one 100 ms cadence.

pub mod cadence;
pub mod clock;
pub mod display;
pub mod surface;
pub mod timeline;

pub use cadence::{TickCadence, TICK_INTERVAL};
pub use clock::{ClockPhase, MarkerSink, PlaybackClock, PlaybackState, SeekDirection};
pub use display::{format_instant, DisplayInstant, WallClockDisplay};
pub use surface::{AnimationTiming, HeadlessSurface, RenderingSurface, SharedSurface, SurfaceId};
pub use timeline::{Timeline, TimelineError};
