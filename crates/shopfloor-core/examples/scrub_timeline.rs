//! Scrubbing example: play a small line forward, then jump around in time.
//!
//! Builds a three-machine log by hand, drives it with a `Player` at 4x speed,
//! then seeks backward and prints the machine and transport state.
//!
//! Run with: `cargo run -p shopfloor-core --example scrub_timeline`

use std::sync::Arc;
use std::time::Duration;

use shopfloor_core::config::{PlaybackConfig, ReplayConfig};
use shopfloor_core::engine::ReplayEngine;
use shopfloor_core::event::{Event, EventKind};
use shopfloor_core::log::EventLog;
use shopfloor_core::playback::{Player, TickOutcome};

fn print_frame(engine: &ReplayEngine) {
    let snap = engine.snapshot();
    println!("t = {:.2}", snap.current_time);
    for m in &snap.machines {
        println!(
            "  {:<6} queue={} status={:?} indicator={:?}",
            m.machine, m.queue, m.status, m.indicator
        );
    }
    for t in &snap.transports {
        println!(
            "  {} {:?} -> {:?} progress={:.2}",
            t.product_id, t.from_machine, t.to_machine, t.progress
        );
    }
}

fn main() {
    let events = vec![
        Event::new(0.0, "SAW", EventKind::QueueIn).with_queue_length(2),
        Event::new(0.5, "SAW", EventKind::ProcStart),
        Event::new(3.0, "SAW", EventKind::ProcComplete),
        Event::new(3.0, "SAW", EventKind::TransportStart)
            .with_product("door-1")
            .with_to("SAND"),
        Event::new(4.0, "SAW", EventKind::QueueOut),
        Event::new(6.0, "SAND", EventKind::TransportEnd).with_product("door-1"),
        Event::new(6.0, "SAND", EventKind::ProcStart),
        Event::new(7.0, "SAND", EventKind::BreakdownStart),
        Event::new(9.5, "SAND", EventKind::BreakdownClear),
        Event::new(10.0, "SAND", EventKind::TransportStart)
            .with_product("door-1")
            .with_to("PACK"),
        Event::new(12.0, "PACK", EventKind::TransportEnd).with_product("door-1"),
    ];

    let log = Arc::new(EventLog::new(events).expect("example log is non-empty"));
    let engine =
        ReplayEngine::with_config(log, ReplayConfig::default().with_checkpoint_interval(4));
    let mut player = Player::new(
        engine,
        PlaybackConfig {
            speed: 4.0,
            ..PlaybackConfig::default()
        },
    );

    // --- Forward playback in half-second frames ---
    player.play();
    loop {
        let outcome = player.tick(Duration::from_millis(500));
        println!("[{}]", player.clock_label());
        if outcome == TickOutcome::Finished {
            break;
        }
    }
    print_frame(player.engine());

    // --- Scrub back to the breakdown, then to the first transport ---
    player.seek(8.0);
    print_frame(player.engine());
    player.seek(4.5);
    print_frame(player.engine());
}
