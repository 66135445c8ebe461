//! The replay engine: reconstructs machine and transport state at any point
//! in simulated time from an [`EventLog`].
//!
//! # State
//!
//! The engine's position is `(current_time, pointer)`, where `pointer` is the
//! index of the next event not yet applied. The pointer is a forward-only
//! cursor:
//!
//! - [`ReplayEngine::advance_to`] applies every event with `time <= target`
//!   that has not been applied yet, then refreshes the active transports.
//! - [`ReplayEngine::seek`] to an earlier time rewinds first (a full reset,
//!   or the nearest checkpoint when checkpoints are enabled) and then
//!   advances, so backward seeks cost a replay rather than an undo.
//!
//! # Ownership
//!
//! The engine exclusively owns both registries. Readers get owned copies via
//! [`ReplayEngine::snapshot`] or shared borrows that end before the next
//! mutating call. There is no internal locking; a host sharing one engine
//! between threads serializes mutating calls itself.

use std::sync::Arc;

use crate::checkpoint::CheckpointIndex;
use crate::config::ReplayConfig;
use crate::event::Event;
use crate::log::EventLog;
use crate::machine::{MachineRegistry, MachineState};
use crate::query::Snapshot;
use crate::transport::{ActiveTransport, TransportRegistry};
use crate::window::time_window;

/// Apply one event to both registries.
pub(crate) fn apply_event(
    machines: &mut MachineRegistry,
    transports: &mut TransportRegistry,
    event: &Event,
) {
    machines.apply(event);
    if event.kind.is_transport() {
        transports.apply(event);
    }
}

// ---------------------------------------------------------------------------
// ReplayEngine
// ---------------------------------------------------------------------------

/// Point-in-time reconstruction of a manufacturing event log.
///
/// Every applied event records its kind as the `last_event` of its machine,
/// except events with an empty machine id: those have no machine state and
/// only take effect on the transport registry.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    log: Arc<EventLog>,
    config: ReplayConfig,

    current_time: f64,
    /// Index of the next unapplied event.
    pointer: usize,

    machines: MachineRegistry,
    transports: TransportRegistry,
    /// Transports visible at `current_time`, rebuilt by every `advance_to`.
    active: Vec<ActiveTransport>,

    checkpoints: Option<CheckpointIndex>,
}

impl ReplayEngine {
    /// Create an engine with the default configuration.
    pub fn new(log: Arc<EventLog>) -> Self {
        Self::with_config(log, ReplayConfig::default())
    }

    /// Create an engine. Checkpoints, if configured, are built here in a
    /// single pass over the log.
    pub fn with_config(log: Arc<EventLog>, config: ReplayConfig) -> Self {
        let checkpoints = config
            .checkpoint_interval
            .map(|interval| CheckpointIndex::build(&log, interval));

        let mut engine = Self {
            current_time: log.start_time(),
            pointer: 0,
            machines: MachineRegistry::default(),
            transports: TransportRegistry::new(),
            active: Vec::new(),
            checkpoints,
            log,
            config,
        };
        engine.reset();
        engine
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Return to the initial state: start time, nothing applied, every known
    /// machine idle with an empty queue.
    pub fn reset(&mut self) {
        self.current_time = self.log.start_time();
        self.pointer = 0;
        self.machines = MachineRegistry::with_machines(self.log.machines());
        self.transports = TransportRegistry::new();
        self.active.clear();
        tracing::debug!(
            start_time = self.current_time,
            machines = self.machines.len(),
            "replay reset"
        );
    }

    /// Move forward to `target`, clamped into the log's time range.
    ///
    /// Applies every not-yet-applied event with `time <= target`. A target
    /// earlier than the current time moves the clock without un-applying
    /// anything; use [`seek`](Self::seek) to go back.
    pub fn advance_to(&mut self, target: f64) {
        let target = self.clamp_target(target);
        let events = self.log.events();

        let first = self.pointer;
        while let Some(event) = events.get(self.pointer) {
            if event.time > target {
                break;
            }
            apply_event(&mut self.machines, &mut self.transports, event);
            self.pointer += 1;
        }

        self.current_time = target;
        self.active = self
            .transports
            .refresh(self.current_time, self.config.grace_period);

        tracing::trace!(
            target,
            applied = self.pointer - first,
            active = self.active.len(),
            "advanced"
        );
    }

    /// Move the clock by `delta` minutes; see [`advance_to`](Self::advance_to).
    pub fn advance(&mut self, delta: f64) {
        self.advance_to(self.current_time + delta);
    }

    /// Move to `target` in either direction.
    pub fn seek(&mut self, target: f64) {
        let target = self.clamp_target(target);
        if target < self.current_time {
            self.rewind(target);
        }
        self.advance_to(target);
    }

    /// Put the registries in a state from which advancing to `target`
    /// reproduces a fresh replay.
    fn rewind(&mut self, target: f64) {
        let applicable = self.log.count_until(target);
        let checkpoint = self
            .checkpoints
            .as_ref()
            .and_then(|index| index.latest_within(applicable));

        match checkpoint {
            Some(cp) => {
                self.current_time = self.log.start_time();
                self.pointer = cp.pointer;
                self.machines = cp.machines.clone();
                self.transports = cp.transports.clone();
                self.active.clear();
                tracing::debug!(target, pointer = cp.pointer, "rewound to checkpoint");
            }
            None => self.reset(),
        }
    }

    fn clamp_target(&self, target: f64) -> f64 {
        if target.is_nan() {
            return self.current_time;
        }
        target.clamp(self.log.start_time(), self.log.end_time())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn start_time(&self) -> f64 {
        self.log.start_time()
    }

    pub fn end_time(&self) -> f64 {
        self.log.end_time()
    }

    /// Index of the next event to be applied.
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Whether the clock has reached the end of the log.
    pub fn is_at_end(&self) -> bool {
        self.current_time >= self.log.end_time()
    }

    pub fn machine(&self, machine: &str) -> Option<&MachineState> {
        self.machines.get(machine)
    }

    /// Machine states in id order.
    pub fn machine_states(&self) -> impl Iterator<Item = &MachineState> {
        self.machines.iter()
    }

    /// Transports visible as of the last `advance_to`, in key order.
    pub fn active_transports(&self) -> &[ActiveTransport] {
        &self.active
    }

    pub fn checkpoints(&self) -> Option<&CheckpointIndex> {
        self.checkpoints.as_ref()
    }

    /// An owned copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// Log events in `[start, end)`. Independent of the replay position.
    pub fn events_in(&self, start: f64, end: f64) -> &[Event] {
        self.log.events_in(start, end)
    }

    /// Log events in the configured window centred on `point`.
    pub fn events_around(&self, point: f64) -> &[Event] {
        let window = time_window(point, self.config.window_minutes);
        self.log.events_in(window.start, window.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind::*;
    use crate::machine::MachineStatus;
    use crate::test_utils::*;

    #[test]
    fn starts_reset() {
        let engine = ReplayEngine::new(Arc::new(scenario_log()));
        assert_eq!(engine.current_time(), 0.0);
        assert_eq!(engine.pointer(), 0);
        assert_eq!(engine.machine_states().count(), 2);
        assert!(engine.active_transports().is_empty());
        assert!(
            engine
                .machine_states()
                .all(|s| s.queue == 0 && s.status == MachineStatus::Idle)
        );
    }

    #[test]
    fn advance_applies_events_up_to_and_including_target() {
        let mut engine = ReplayEngine::new(Arc::new(scenario_log()));
        engine.advance_to(5.0);
        assert_eq!(engine.pointer(), 2);
        assert_eq!(engine.current_time(), 5.0);
        assert_eq!(engine.active_transports().len(), 1);
    }

    #[test]
    fn targets_are_clamped_to_log_range() {
        let mut engine = ReplayEngine::new(Arc::new(scenario_log()));
        engine.advance_to(1_000.0);
        assert_eq!(engine.current_time(), engine.end_time());
        assert!(engine.is_at_end());

        engine.seek(-50.0);
        assert_eq!(engine.current_time(), engine.start_time());
        assert_eq!(engine.pointer(), 1);
    }

    #[test]
    fn nan_target_keeps_current_time() {
        let mut engine = ReplayEngine::new(Arc::new(scenario_log()));
        engine.advance_to(7.0);
        engine.advance_to(f64::NAN);
        assert_eq!(engine.current_time(), 7.0);
        engine.seek(f64::NAN);
        assert_eq!(engine.current_time(), 7.0);
        assert_eq!(engine.pointer(), 2);
    }

    #[test]
    fn advance_by_delta() {
        let mut engine = ReplayEngine::new(Arc::new(scenario_log()));
        engine.advance(4.0);
        engine.advance(4.0);
        assert_eq!(engine.current_time(), 8.0);
        assert_eq!(engine.pointer(), 2);
    }

    #[test]
    fn backward_advance_moves_clock_but_not_pointer() {
        let mut engine = ReplayEngine::new(Arc::new(scenario_log()));
        engine.advance_to(12.0);
        engine.advance_to(2.0);
        assert_eq!(engine.current_time(), 2.0);
        assert_eq!(engine.pointer(), 3);
        assert_eq!(
            engine.machine("M1").map(|s| s.status),
            Some(MachineStatus::Idle)
        );
    }

    #[test]
    fn seek_backward_replays() {
        let mut engine = ReplayEngine::new(Arc::new(scenario_log()));
        engine.advance_to(12.0);
        engine.seek(7.0);
        assert_eq!(engine.pointer(), 2);
        assert_eq!(
            engine.machine("M1").map(|s| s.status),
            Some(MachineStatus::Processing)
        );
    }

    #[test]
    fn empty_machine_events_do_not_create_states() {
        let log = EventLog::new(vec![
            Event::new(0.0, "M1", QueueIn),
            Event::new(1.0, "", TransportStart).with_product("P1").with_from("M1"),
        ])
        .unwrap();
        let mut engine = ReplayEngine::new(Arc::new(log));
        engine.advance_to(1.0);
        assert_eq!(engine.machine_states().count(), 1);
        assert!(engine.machine("").is_none());
        assert_eq!(engine.machine("M1").and_then(|m| m.last_event), Some(QueueIn));
        assert_eq!(engine.active_transports().len(), 1);
    }

    #[test]
    fn events_around_uses_configured_window() {
        let engine = ReplayEngine::with_config(
            Arc::new(scenario_log()),
            ReplayConfig {
                window_minutes: 4.0,
                ..ReplayConfig::default()
            },
        );
        let times: Vec<f64> = engine.events_around(9.0).iter().map(|e| e.time).collect();
        assert_eq!(times, vec![10.0]);
        assert_eq!(engine.pointer(), 0);
    }

    #[test]
    fn checkpoint_rewind_matches_reset_rewind() {
        let log = Arc::new(busy_log(200));
        let mut plain = ReplayEngine::new(log.clone());
        let mut fast =
            ReplayEngine::with_config(log, ReplayConfig::default().with_checkpoint_interval(16));
        assert!(fast.checkpoints().is_some_and(|c| !c.is_empty()));

        for target in [150.0, 90.0, 40.0, 3.0, 199.0, 120.5] {
            plain.seek(target);
            fast.seek(target);
            assert_eq!(plain.snapshot(), fast.snapshot(), "diverged at {target}");
            assert_eq!(plain.pointer(), fast.pointer());
        }
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReplayEngine>();
    }
}
