//! Headless playback over file-backed logs.
//!
//! Drives a `Player` frame by frame the way a UI host would, over logs loaded
//! from CSV and from the binary archive, and checks both sources replay to
//! identical frames.

use std::sync::Arc;
use std::time::Duration;

use shopfloor_core::config::{PlaybackConfig, ReplayConfig};
use shopfloor_core::engine::ReplayEngine;
use shopfloor_core::log::EventLog;
use shopfloor_core::playback::{Player, TickOutcome, format_clock, parse_speed_label};
use shopfloor_core::query::Snapshot;
use shopfloor_core::test_utils::busy_log;
use shopfloor_data::loader::{load_event_log, write_archive};

/// Render a log back out as CSV in the simulator's column layout.
fn to_csv(log: &EventLog) -> String {
    let mut text = String::from(
        "time_min,machine,event,product_id,entity_id,from_machine,to_machine,q_len\n",
    );
    for e in log.events() {
        text.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            e.time,
            e.machine,
            e.kind,
            e.product_id,
            e.entity_id,
            e.from_machine.as_deref().unwrap_or_default(),
            e.to_machine.as_deref().unwrap_or_default(),
            e.queue_length.map(|q| q.to_string()).unwrap_or_default(),
        ));
    }
    text
}

/// Play `log` to the end at a fixed frame time, collecting every frame.
fn play_frames(
    log: Arc<EventLog>,
    replay: ReplayConfig,
    playback: PlaybackConfig,
) -> Vec<Snapshot> {
    let frame = playback.frame_interval();
    let mut player = Player::new(ReplayEngine::with_config(log, replay), playback);
    player.play();

    let mut frames = vec![player.engine().snapshot()];
    loop {
        let outcome = player.tick(frame);
        frames.push(player.engine().snapshot());
        if outcome == TickOutcome::Finished {
            break;
        }
        assert!(frames.len() < 100_000, "playback did not finish");
    }
    assert!(!player.is_playing());
    frames
}

fn fast_playback() -> PlaybackConfig {
    PlaybackConfig {
        minutes_per_second: 30.0,
        frame_interval_ms: 40,
        ..PlaybackConfig::default()
    }
}

#[test]
fn csv_and_archive_replay_identically() {
    let dir = tempfile::tempdir().unwrap();
    let source = busy_log(300);

    let csv_path = dir.path().join("busy.csv");
    std::fs::write(&csv_path, to_csv(&source)).unwrap();
    let from_csv = load_event_log(&csv_path).unwrap();
    assert_eq!(from_csv.events(), source.events());

    let archive_path = dir.path().join("busy.sflog");
    write_archive(&from_csv, &archive_path).unwrap();
    let from_archive = load_event_log(&archive_path).unwrap();

    let a = play_frames(Arc::new(from_csv), ReplayConfig::default(), fast_playback());
    let b = play_frames(
        Arc::new(from_archive),
        ReplayConfig::default().with_checkpoint_interval(32),
        fast_playback(),
    );
    assert_eq!(a, b);
}

#[test]
fn playback_ends_paused_at_end_time() {
    let log = Arc::new(busy_log(120));
    let end = log.end_time();
    let frames = play_frames(log, ReplayConfig::default(), fast_playback());

    let last = frames.last().unwrap();
    assert_eq!(last.current_time, end);
    assert!(
        frames
            .windows(2)
            .all(|w| w[0].current_time <= w[1].current_time),
        "clock never runs backwards during playback"
    );
}

#[test]
fn speed_selector_scales_frame_advance() {
    let log = Arc::new(busy_log(400));
    let mut player = Player::new(ReplayEngine::new(log), PlaybackConfig::default());
    player.set_speed(parse_speed_label("4x"));
    player.play();

    player.tick(Duration::from_secs(15));
    assert_eq!(player.engine().current_time(), 60.0);
    assert_eq!(format_clock(player.engine().current_time()), "01:00:00");
}

#[test]
fn scrubbing_a_paused_player() {
    let log = Arc::new(busy_log(200));
    let mut player = Player::new(
        ReplayEngine::with_config(
            log.clone(),
            ReplayConfig::default().with_checkpoint_interval(16),
        ),
        PlaybackConfig::default(),
    );

    player.seek(80.0);
    player.seek(12.5);
    assert_eq!(player.tick(Duration::from_secs(1)), TickOutcome::Idle);

    let mut fresh = ReplayEngine::new(log);
    fresh.advance_to(12.5);
    assert_eq!(player.engine().snapshot(), fresh.snapshot());
}
