//! Subcommand implementations. Each writes its result to `out` so the
//! commands can be exercised against an in-memory buffer.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use shopfloor_core::engine::ReplayEngine;
use shopfloor_core::event::Event;
use shopfloor_core::log::{EventLog, LogMetadata};
use shopfloor_core::machine::MachineStatus;
use shopfloor_core::playback::{Player, TickOutcome, parse_speed_label};
use shopfloor_core::window::time_window;
use shopfloor_data::config::{ShopfloorConfig, load_config};
use shopfloor_data::loader::{DataLoadError, load_event_log, write_archive};
use shopfloor_data::timeline::{TimelineRow, load_product_timeline};
use tracing::info;

/// Resolve the effective configuration: config file, then environment, then
/// the `--data` flag.
pub fn load_settings(config: Option<&Path>, data: Option<PathBuf>) -> Result<ShopfloorConfig> {
    let mut settings = match config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ShopfloorConfig::default(),
    };
    settings.apply_env();
    if let Some(path) = data {
        settings.data.events_path = Some(path);
    }
    Ok(settings)
}

fn open_log(settings: &ShopfloorConfig) -> Result<Arc<EventLog>> {
    let path = settings
        .data
        .resolved_events_path()
        .ok_or(DataLoadError::NotConfigured)?;
    let log = load_event_log(&path)
        .with_context(|| format!("failed to load event log {}", path.display()))?;
    Ok(Arc::new(log))
}

fn open_engine(settings: &ShopfloorConfig) -> Result<ReplayEngine> {
    Ok(ReplayEngine::with_config(
        open_log(settings)?,
        settings.replay.clone(),
    ))
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

// ===========================================================================
// JSON commands
// ===========================================================================

#[derive(Serialize)]
struct MetadataOutput<'a> {
    #[serde(flatten)]
    metadata: &'a LogMetadata,
    window_minutes: f64,
}

#[derive(Serialize)]
struct EventsOutput<'a> {
    start: f64,
    end: f64,
    count: usize,
    events: &'a [Event],
}

#[derive(Serialize)]
struct ProductOutput {
    entity_id: i64,
    timeline: Vec<TimelineRow>,
}

pub fn metadata(settings: &ShopfloorConfig, out: &mut impl Write) -> Result<()> {
    let log = open_log(settings)?;
    write_json(
        out,
        &MetadataOutput {
            metadata: log.metadata(),
            window_minutes: settings.replay.window_minutes,
        },
    )
}

pub fn snapshot(settings: &ShopfloorConfig, at: f64, out: &mut impl Write) -> Result<()> {
    let mut engine = open_engine(settings)?;
    engine.seek(at);
    write_json(out, &engine.snapshot())
}

pub fn events(
    settings: &ShopfloorConfig,
    start: f64,
    end: f64,
    out: &mut impl Write,
) -> Result<()> {
    if !(start.is_finite() && end.is_finite()) || end <= start {
        bail!("--end ({end}) must be greater than --start ({start})");
    }
    let log = open_log(settings)?;
    let events = log.events_in(start, end);
    write_json(
        out,
        &EventsOutput {
            start,
            end,
            count: events.len(),
            events,
        },
    )
}

pub fn window(
    settings: &ShopfloorConfig,
    at: f64,
    width: Option<f64>,
    out: &mut impl Write,
) -> Result<()> {
    let width = width.unwrap_or(settings.replay.window_minutes);
    if !(width.is_finite() && width > 0.0) {
        bail!("--width must be a positive number of minutes, got {width}");
    }
    let log = open_log(settings)?;
    let window = time_window(at, width);
    let events = log.events_in(window.start, window.end);
    write_json(
        out,
        &EventsOutput {
            start: window.start,
            end: window.end,
            count: events.len(),
            events,
        },
    )
}

pub fn product(settings: &ShopfloorConfig, entity_id: i64, out: &mut impl Write) -> Result<()> {
    let path = settings
        .data
        .resolved_product_timeline_path()
        .ok_or(DataLoadError::TimelineNotConfigured)?;
    let timeline = load_product_timeline(&path, entity_id)?;
    write_json(
        out,
        &ProductOutput {
            entity_id,
            timeline,
        },
    )
}

// ===========================================================================
// Playback
// ===========================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct PlayOptions<'a> {
    pub speed: Option<&'a str>,
    pub minutes_per_second: Option<f64>,
    pub frames: Option<usize>,
    pub realtime: bool,
}

pub fn play(
    settings: &ShopfloorConfig,
    options: PlayOptions<'_>,
    out: &mut impl Write,
) -> Result<()> {
    let mut playback = settings.playback.clone();
    if let Some(rate) = options.minutes_per_second {
        playback.minutes_per_second = rate;
    }
    let engine = open_engine(settings)?;
    let mut player = Player::new(engine, playback);
    if let Some(label) = options.speed {
        player.set_speed(parse_speed_label(label));
    }
    let frame = player.config().frame_interval();
    let step = player.sim_delta(frame.max(Duration::from_millis(1)));
    if !(step.is_finite() && step > 0.0) {
        bail!(
            "playback rate must be positive (minutes per second {}, speed {})",
            player.config().minutes_per_second,
            player.speed()
        );
    }
    let max_frames = options.frames.unwrap_or(usize::MAX);

    info!(speed = player.speed(), frame_ms = frame.as_millis() as u64, "starting playback");
    player.play();
    write_frame(out, &player)?;

    let mut frames = 0;
    while frames < max_frames {
        if options.realtime {
            std::thread::sleep(frame);
        }
        let outcome = player.tick(frame.max(Duration::from_millis(1)));
        frames += 1;
        write_frame(out, &player)?;
        if outcome != TickOutcome::Advanced {
            break;
        }
    }
    Ok(())
}

fn write_frame(out: &mut impl Write, player: &Player) -> Result<()> {
    let engine = player.engine();
    let busy = engine
        .machine_states()
        .filter(|m| m.status != MachineStatus::Idle)
        .count();
    let queued: u32 = engine.machine_states().map(|m| m.queue).sum();
    writeln!(
        out,
        "{}  t={:.2}  busy={}  queued={}  transports={}",
        player.clock_label(),
        engine.current_time(),
        busy,
        queued,
        engine.active_transports().len()
    )?;
    Ok(())
}

// ===========================================================================
// Archive
// ===========================================================================

pub fn pack(settings: &ShopfloorConfig, path: &Path, out: &mut impl Write) -> Result<()> {
    let log = open_log(settings)?;
    write_archive(&log, path).with_context(|| format!("failed to write {}", path.display()))?;
    write_json(
        out,
        &serde_json::json!({
            "archive": path.display().to_string(),
            "events": log.len(),
        }),
    )
}
