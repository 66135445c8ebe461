//! Tunables for replay and playback.
//!
//! Both structs deserialize with every field optional, so a config file only
//! needs to name the values it changes.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::transport::DEFAULT_GRACE_PERIOD;

/// Default width of a range-query window, in simulation minutes.
pub const DEFAULT_WINDOW_MINUTES: f64 = 5.0;

// ---------------------------------------------------------------------------
// ReplayConfig
// ---------------------------------------------------------------------------

/// Settings for a [`ReplayEngine`](crate::engine::ReplayEngine).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// How long a completed transport stays visible, in minutes.
    pub grace_period: f64,
    /// Store a registry checkpoint every this many events. `None` disables
    /// checkpoints and backward seeks replay from the start.
    pub checkpoint_interval: Option<NonZeroUsize>,
    /// Width of the window used by [`time_window`](crate::window::time_window) queries.
    pub window_minutes: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            checkpoint_interval: None,
            window_minutes: DEFAULT_WINDOW_MINUTES,
        }
    }
}

impl ReplayConfig {
    pub fn with_checkpoint_interval(mut self, events: usize) -> Self {
        self.checkpoint_interval = NonZeroUsize::new(events);
        self
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Settings for a [`Player`](crate::playback::Player).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Simulation minutes advanced per real second at speed 1.
    pub minutes_per_second: f64,
    /// Speed multiplier applied on top of `minutes_per_second`.
    pub speed: f64,
    /// Real time between frames for hosts driving the player on a timer.
    pub frame_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            minutes_per_second: 1.0,
            speed: 1.0,
            frame_interval_ms: 16,
        }
    }
}

impl PlaybackConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
