//! Shopfloor Core -- the replay engine for manufacturing event logs.
//!
//! Given a log of discrete machine events, the engine reconstructs the status
//! of every machine and every in-flight product transport at any requested
//! point in simulated time. It supports forward playback, seeking in either
//! direction, and idempotent re-evaluation of the same time.
//!
//! # Replay Model
//!
//! 1. **Log** -- events are sorted once by time (stable, so ties keep log
//!    order) into an immutable [`log::EventLog`], shared via `Arc`.
//! 2. **Apply** -- a forward-only pointer applies each event to the machine
//!    and transport registries owned by the [`engine::ReplayEngine`].
//! 3. **Refresh** -- after every move, completed transports past their grace
//!    period are evicted and the rest are copied into the active set.
//! 4. **Rewind** -- seeking backward resets (or restores a checkpoint) and
//!    replays, so any position is reproducible from the log alone.
//!
//! ```rust,ignore
//! let log = Arc::new(EventLog::new(events)?);
//! let mut engine = ReplayEngine::new(log);
//! engine.seek(42.0);
//! let frame = engine.snapshot();
//! ```
//!
//! # Key Types
//!
//! - [`engine::ReplayEngine`] -- pointer, clock and registries.
//! - [`machine::MachineState`] -- queue depth, status and last event.
//! - [`transport::Transport`] / [`transport::TransportKey`] -- movement
//!   lifecycle and the identity that matches START, END and CANCEL.
//! - [`interpolate::progress`] -- transport progress for renderers.
//! - [`query::Snapshot`] -- owned, serializable view of one instant.
//! - [`playback::Player`] -- wall-clock driven playback.
//! - [`serialize`] -- versioned binary archive of an event log.

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod event;
pub mod interpolate;
pub mod log;
pub mod machine;
pub mod playback;
pub mod query;
pub mod serialize;
pub mod transport;
pub mod window;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{PlaybackConfig, ReplayConfig};
pub use engine::ReplayEngine;
pub use event::{Event, EventKind};
pub use log::{EventLog, LogError};
pub use query::Snapshot;
