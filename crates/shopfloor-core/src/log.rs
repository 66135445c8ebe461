//! The immutable, time-sorted event log the replay engine consumes.
//!
//! Construction sorts events by time with a stable sort, so events sharing a
//! timestamp keep the order in which they were supplied. Everything derived
//! from the events (time range, machine set, metadata) is computed once here
//! and never changes afterwards.

use std::collections::BTreeSet;

use crate::event::{Event, EventKind, non_empty};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while building an [`EventLog`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LogError {
    #[error("event log contains no events")]
    EmptyLog,
    #[error("event {index} has a non-finite time ({time})")]
    NonFiniteTime { index: usize, time: f64 },
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// A transport route observed in the log: a machine that started a transport
/// towards a named destination.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TransportEdge {
    pub from: String,
    pub to: String,
}

/// Summary of a log for hosts that need to set up a view before replaying.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogMetadata {
    pub start_time: f64,
    pub end_time: f64,
    /// Distinct non-empty machine ids, sorted.
    pub machines: Vec<String>,
    /// Distinct routes from `TRANSPORT_START` events, sorted.
    pub edges: Vec<TransportEdge>,
    pub event_count: usize,
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// A non-empty, time-sorted sequence of events.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
    metadata: LogMetadata,
}

impl EventLog {
    /// Build a log from events in any order.
    pub fn new(events: impl IntoIterator<Item = Event>) -> Result<Self, LogError> {
        let mut events: Vec<Event> = events.into_iter().collect();
        if events.is_empty() {
            return Err(LogError::EmptyLog);
        }
        if let Some((index, ev)) = events.iter().enumerate().find(|(_, e)| !e.time.is_finite()) {
            return Err(LogError::NonFiniteTime {
                index,
                time: ev.time,
            });
        }

        // `sort_by` is stable: equal times keep their supplied order.
        events.sort_by(|a, b| a.time.total_cmp(&b.time));

        let metadata = build_metadata(&events);
        Ok(Self { events, metadata })
    }

    /// Time of the first event.
    pub fn start_time(&self) -> f64 {
        self.metadata.start_time
    }

    /// Time of the last event.
    pub fn end_time(&self) -> f64 {
        self.metadata.end_time
    }

    /// The sorted events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; an empty log cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct non-empty machine ids, sorted.
    pub fn machines(&self) -> &[String] {
        &self.metadata.machines
    }

    pub fn metadata(&self) -> &LogMetadata {
        &self.metadata
    }

    /// Number of events with `time <= target`.
    pub fn count_until(&self, target: f64) -> usize {
        self.events.partition_point(|e| e.time <= target)
    }

    /// Events with `start <= time < end`, in log order.
    ///
    /// Read-only: independent of any engine's replay position.
    pub fn events_in(&self, start: f64, end: f64) -> &[Event] {
        if start.is_nan() || end.is_nan() || end <= start {
            return &[];
        }
        let lo = self.events.partition_point(|e| e.time < start);
        let hi = self.events.partition_point(|e| e.time < end);
        self.events.get(lo..hi).unwrap_or(&[])
    }
}

fn build_metadata(events: &[Event]) -> LogMetadata {
    let machines: BTreeSet<&str> = events.iter().filter_map(Event::machine_id).collect();

    let edges: BTreeSet<TransportEdge> = events
        .iter()
        .filter(|e| e.kind == EventKind::TransportStart)
        .filter_map(|e| {
            let from = e.machine_id()?;
            let to = non_empty(e.to_machine.as_deref())?;
            Some(TransportEdge {
                from: from.to_string(),
                to: to.to_string(),
            })
        })
        .collect();

    LogMetadata {
        start_time: events.first().map_or(0.0, |e| e.time),
        end_time: events.last().map_or(0.0, |e| e.time),
        machines: machines.into_iter().map(str::to_string).collect(),
        edges: edges.into_iter().collect(),
        event_count: events.len(),
    }
}
