//! Registry checkpoints that bound the cost of backward seeks.
//!
//! The index is built in one pass over the log, applying events to scratch
//! registries exactly as a fresh replay would (no transport eviction runs
//! between events) and keeping a copy after every `interval` events. A
//! rewind restores the latest copy whose events all precede the target, so
//! the result is identical to resetting and replaying from the start.

use std::num::NonZeroUsize;

use crate::engine::apply_event;
use crate::log::EventLog;
use crate::machine::MachineRegistry;
use crate::transport::TransportRegistry;

/// Registry state after the first `pointer` events of a log.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    /// Number of events applied.
    pub pointer: usize,
    pub(crate) machines: MachineRegistry,
    pub(crate) transports: TransportRegistry,
}

/// Checkpoints ordered by pointer.
#[derive(Debug, Clone)]
pub struct CheckpointIndex {
    interval: NonZeroUsize,
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointIndex {
    pub fn build(log: &EventLog, interval: NonZeroUsize) -> Self {
        let mut machines = MachineRegistry::with_machines(log.machines());
        let mut transports = TransportRegistry::new();
        let mut checkpoints = Vec::with_capacity(log.len() / interval.get());

        for (i, event) in log.events().iter().enumerate() {
            apply_event(&mut machines, &mut transports, event);
            let applied = i + 1;
            if applied % interval.get() == 0 {
                checkpoints.push(Checkpoint {
                    pointer: applied,
                    machines: machines.clone(),
                    transports: transports.clone(),
                });
            }
        }

        tracing::debug!(
            interval = interval.get(),
            checkpoints = checkpoints.len(),
            "checkpoint index built"
        );
        Self {
            interval,
            checkpoints,
        }
    }

    /// The latest checkpoint covering no more than `applicable` events.
    pub fn latest_within(&self, applicable: usize) -> Option<&Checkpoint> {
        let idx = self
            .checkpoints
            .partition_point(|cp| cp.pointer <= applicable);
        idx.checked_sub(1).and_then(|i| self.checkpoints.get(i))
    }

    pub fn interval(&self) -> NonZeroUsize {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}
