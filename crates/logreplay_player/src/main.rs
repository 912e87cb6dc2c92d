// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless replay player.
//!
//! Loads a session payload from a JSON file, wires headless rendering
//! surfaces to the playback clock, and runs the 100 ms cadence loop until
//! the replay ends. Stands in for a graphical host: one surface for the
//! process model, one for the timeline bar, and one per log carrying its
//! progress-ring animation timing.
//!
//! Usage: `logreplay_player <payload.json> [speed_ratio]`

use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use logreplay_clock::{DisplayInstant, HeadlessSurface, SharedSurface, WallClockDisplay};
use logreplay_session::{ReplaySession, SessionPayload};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Keeps the latest digital-clock readout so the final state can be
/// reported when the loop exits.
#[derive(Clone, Default)]
struct LatestReadout(Rc<RefCell<Option<DisplayInstant>>>);

impl LatestReadout {
    fn get(&self) -> Option<DisplayInstant> {
        self.0.borrow().clone()
    }
}

impl WallClockDisplay for LatestReadout {
    fn show(&mut self, instant: DisplayInstant) {
        tracing::debug!(date = %instant.date, time = %instant.time, "clock");
        *self.0.borrow_mut() = Some(instant);
    }
}

fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("logreplay_player=info".parse().unwrap())
        .add_directive("logreplay_session=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        tracing::error!("usage: logreplay_player <payload.json> [speed_ratio]");
        return ExitCode::FAILURE;
    };
    let speed_ratio: Option<f64> = args.next().and_then(|raw| raw.parse().ok());

    match run(&path, speed_ratio) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("replay failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str, speed_ratio: Option<f64>) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let payload = SessionPayload::from_json(&raw)?;
    let session = ReplaySession::from_payload(&payload)?;

    for log in session.logs() {
        tracing::info!(
            filename = %log.filename,
            total = log.total,
            play = log.play,
            reliable = log.reliable,
            fitness = log.exact_trace_fitness,
            "log loaded"
        );
    }

    let mut clock = session.build_clock();
    let board = session.marker_board();

    // One surface per independently-timed animation: model, timeline bar,
    // and a progress ring per log.
    let mut surfaces = vec![
        SharedSurface::new(HeadlessSurface::new()),
        SharedSurface::new(HeadlessSurface::new()),
    ];
    for log in session.logs() {
        surfaces.push(SharedSurface::new(
            HeadlessSurface::new().with_timings(vec![log.progress]),
        ));
    }
    for surface in &surfaces {
        clock.register_surface(Box::new(surface.clone()));
    }

    let readout = LatestReadout::default();
    clock.set_display(Box::new(readout.clone()));

    clock.start();
    if let Some(ratio) = speed_ratio {
        clock.change_speed(ratio);
    }
    clock.resume();

    let interval = clock.cadence().interval();
    let engine_step = interval.as_secs_f64();
    while clock.is_ticking() {
        std::thread::sleep(interval);
        for surface in &surfaces {
            surface.advance(engine_step);
        }
        clock.tick();
        tracing::trace!(
            engine_seconds = clock.get_time(),
            visible = board.visible_markers(),
            "tick"
        );
    }

    if let Some(instant) = readout.get() {
        tracing::info!(date = %instant.date, time = %instant.time, "replay finished");
    }
    tracing::info!(
        slot = board.last_slot_time(),
        speed = clock.state().speed_ratio,
        "final position"
    );

    Ok(())
}
