//! Real-time playback driver.
//!
//! A [`Player`] turns elapsed wall-clock time into simulation time and feeds
//! it to a [`ReplayEngine`]. Hosts call [`Player::tick`] from their frame
//! timer and read the engine between ticks.

use std::time::Duration;

use crate::config::PlaybackConfig;
use crate::engine::ReplayEngine;

/// What a call to [`Player::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused, or the elapsed time maps to no forward movement.
    Idle,
    /// The clock moved forward.
    Advanced,
    /// The clock reached the end of the log and playback paused.
    Finished,
}

/// Playback state wrapped around a single engine.
#[derive(Debug, Clone)]
pub struct Player {
    engine: ReplayEngine,
    config: PlaybackConfig,
    playing: bool,
}

impl Player {
    pub fn new(engine: ReplayEngine, config: PlaybackConfig) -> Self {
        Self {
            engine,
            config,
            playing: false,
        }
    }

    pub fn engine(&self) -> &ReplayEngine {
        &self.engine
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn into_engine(self) -> ReplayEngine {
        self.engine
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing;
    }

    pub fn speed(&self) -> f64 {
        self.config.speed
    }

    /// Set the speed multiplier. Non-finite or negative values are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed >= 0.0 {
            self.config.speed = speed;
        }
    }

    /// Jump to `target` without changing play/pause state.
    pub fn seek(&mut self, target: f64) {
        self.engine.seek(target);
    }

    /// Back to the start, paused.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.playing = false;
    }

    /// Simulation minutes covered by `elapsed` real time at the current speed.
    pub fn sim_delta(&self, elapsed: Duration) -> f64 {
        elapsed.as_secs_f64() * self.config.minutes_per_second * self.config.speed
    }

    /// Advance by the simulation time corresponding to `elapsed`.
    ///
    /// A delta that is not a positive finite number leaves the clock where
    /// it is and reports `Idle`.
    pub fn tick(&mut self, elapsed: Duration) -> TickOutcome {
        if !self.playing {
            return TickOutcome::Idle;
        }
        let delta = self.sim_delta(elapsed);
        if !(delta.is_finite() && delta > 0.0) {
            return TickOutcome::Idle;
        }
        self.engine.advance(delta);
        if self.engine.is_at_end() {
            self.engine.seek(self.engine.end_time());
            self.playing = false;
            tracing::debug!(end_time = self.engine.end_time(), "playback finished");
            return TickOutcome::Finished;
        }
        TickOutcome::Advanced
    }

    /// `elapsed / remaining`, both as `HH:MM:SS`.
    pub fn clock_label(&self) -> String {
        let current = self.engine.current_time();
        let remaining = self.engine.end_time() - current;
        format!("{} / {}", format_clock(current), format_clock(remaining))
    }
}

/// Render simulation minutes as `HH:MM:SS`, truncating fractional seconds.
/// Negative values render as zero.
pub fn format_clock(minutes: f64) -> String {
    let total_seconds = (minutes * 60.0).max(0.0) as u64;
    let hours = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{mins:02}:{secs:02}")
}

/// Parse a speed selector such as `"0.5x"` or `"2"`. Falls back to 1.0.
pub fn parse_speed_label(label: &str) -> f64 {
    label
        .trim()
        .trim_end_matches(['x', 'X'])
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .unwrap_or(1.0)
}
