//! Read-only snapshots of replay state.
//!
//! All types are owned copies, so a renderer or request handler can hold a
//! snapshot while the engine keeps advancing.

use crate::engine::ReplayEngine;
use crate::event::EventKind;
use crate::machine::{Indicator, MachineState, MachineStatus};
use crate::transport::ActiveTransport;

// ---------------------------------------------------------------------------
// Machine snapshot
// ---------------------------------------------------------------------------

/// A machine's state at the snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MachineSnapshot {
    pub machine: String,
    pub queue: u32,
    pub status: MachineStatus,
    pub last_event: Option<EventKind>,
    /// Display state derived from status and queue.
    pub indicator: Indicator,
}

impl From<&MachineState> for MachineSnapshot {
    fn from(state: &MachineState) -> Self {
        Self {
            machine: state.machine.clone(),
            queue: state.queue,
            status: state.status,
            last_event: state.last_event,
            indicator: state.indicator(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport snapshot
// ---------------------------------------------------------------------------

/// A transport visible at the snapshot time.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransportSnapshot {
    pub product_id: String,
    pub entity_id: String,
    pub from_machine: Option<String>,
    pub to_machine: Option<String>,
    pub start_time: f64,
    pub end_time: Option<f64>,
    /// Progress as a 0..1 fraction at the snapshot time.
    pub progress: f64,
}

impl From<&ActiveTransport> for TransportSnapshot {
    fn from(active: &ActiveTransport) -> Self {
        let t = &active.transport;
        Self {
            product_id: t.product_id.clone(),
            entity_id: t.entity_id.clone(),
            from_machine: t.from_machine.clone(),
            to_machine: t.to_machine.clone(),
            start_time: t.start_time,
            end_time: t.end_time,
            progress: active.progress,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Snapshot {
    pub current_time: f64,
    pub start_time: f64,
    pub end_time: f64,
    /// Machines in id order.
    pub machines: Vec<MachineSnapshot>,
    /// Active transports in key order.
    pub transports: Vec<TransportSnapshot>,
}

impl Snapshot {
    pub fn capture(engine: &ReplayEngine) -> Self {
        Self {
            current_time: engine.current_time(),
            start_time: engine.start_time(),
            end_time: engine.end_time(),
            machines: engine.machine_states().map(MachineSnapshot::from).collect(),
            transports: engine
                .active_transports()
                .iter()
                .map(TransportSnapshot::from)
                .collect(),
        }
    }

    pub fn machine(&self, machine: &str) -> Option<&MachineSnapshot> {
        self.machines.iter().find(|m| m.machine == machine)
    }

    /// The first visible transport carrying `product_id`.
    pub fn transport(&self, product_id: &str) -> Option<&TransportSnapshot> {
        self.transports.iter().find(|t| t.product_id == product_id)
    }
}
