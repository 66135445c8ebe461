//! Derived per-machine state and the registry that holds it.

use std::collections::BTreeMap;

use crate::event::{Event, EventKind};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Activity status of a machine.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    #[default]
    Idle,
    Processing,
    Breakdown,
}

/// What a renderer should highlight for a machine.
///
/// Precedence: breakdown, then processing, then a non-empty queue, then idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Idle,
    Queue,
    Processing,
    Breakdown,
}

// ---------------------------------------------------------------------------
// MachineState
// ---------------------------------------------------------------------------

/// Status of one machine at the engine's current time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MachineState {
    pub machine: String,
    /// Items waiting at the machine. Never negative.
    pub queue: u32,
    pub status: MachineStatus,
    /// The most recent event kind applied to this machine.
    pub last_event: Option<EventKind>,
}

impl MachineState {
    /// Default state: empty queue, idle, no events seen.
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            queue: 0,
            status: MachineStatus::Idle,
            last_event: None,
        }
    }

    pub fn has_queue(&self) -> bool {
        self.queue > 0
    }

    pub fn indicator(&self) -> Indicator {
        match self.status {
            MachineStatus::Breakdown => Indicator::Breakdown,
            MachineStatus::Processing => Indicator::Processing,
            MachineStatus::Idle if self.has_queue() => Indicator::Queue,
            MachineStatus::Idle => Indicator::Idle,
        }
    }

    /// Apply the machine-side effects of an event.
    ///
    /// The absolute queue override is applied before the unit adjustment
    /// implied by the kind, so an event may carry both.
    pub(crate) fn apply(&mut self, event: &Event) {
        self.last_event = Some(event.kind);

        if let Some(len) = event.queue_length {
            self.queue = clamp_queue(len);
        }

        match event.kind {
            EventKind::QueueIn => self.queue = self.queue.saturating_add(1),
            EventKind::QueueOut => self.queue = self.queue.saturating_sub(1),
            EventKind::ProcStart => self.status = MachineStatus::Processing,
            EventKind::ProcEnd | EventKind::ProcComplete => self.status = MachineStatus::Idle,
            EventKind::BreakdownStart => self.status = MachineStatus::Breakdown,
            EventKind::BreakdownEnd | EventKind::BreakdownClear => {
                self.status = MachineStatus::Idle
            }
            EventKind::TransportStart | EventKind::TransportEnd | EventKind::TransportCancel => {}
        }
    }
}

fn clamp_queue(len: i64) -> u32 {
    u32::try_from(len.max(0)).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// MachineRegistry
// ---------------------------------------------------------------------------

/// Machine states keyed by machine id, iterated in id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineRegistry {
    states: BTreeMap<String, MachineState>,
}

impl MachineRegistry {
    /// A registry holding a default state for every given machine.
    pub fn with_machines<'a>(machines: impl IntoIterator<Item = &'a String>) -> Self {
        let states = machines
            .into_iter()
            .map(|m| (m.clone(), MachineState::new(m.clone())))
            .collect();
        Self { states }
    }

    /// Apply an event to the state of its machine, creating the state if the
    /// machine has not been seen before. Events without a machine are ignored.
    pub(crate) fn apply(&mut self, event: &Event) {
        let Some(machine) = event.machine_id() else {
            return;
        };
        self.states
            .entry(machine.to_string())
            .or_insert_with(|| MachineState::new(machine))
            .apply(event);
    }

    pub fn get(&self, machine: &str) -> Option<&MachineState> {
        self.states.get(machine)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MachineState> {
        self.states.values()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
