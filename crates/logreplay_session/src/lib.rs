// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay session configuration and case markers.
//!
//! This crate loads the server's session payload and turns it into the
//! pieces a replay host needs:
//! - Validated [`Timeline`](logreplay_clock::Timeline) built from the
//!   payload's timeline block
//! - Per-log summaries (metrics and progress-ring timing)
//! - Case markers with slot-unit paths, collected on a [`MarkerBoard`]
//!   the playback clock refreshes each tick

pub mod marker;
pub mod payload;
pub mod session;

pub use marker::{CaseMarker, MarkerPosition, PathSegment};
pub use payload::{
    parse_date_label, LogPayload, PathSegmentPayload, ProgressPayload, SessionError,
    SessionPayload, TimelinePayload, TokenAnimationPayload,
};
pub use session::{LogMarkers, LogSummary, MarkerBoard, ReplaySession, SharedMarkerBoard};
