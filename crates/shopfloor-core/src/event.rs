//! Machine event records and the closed set of event kinds.
//!
//! An [`Event`] is one row of the machine event log. Events are immutable
//! once they reach the engine; the parsing collaborator is responsible for
//! normalizing empty optional fields to `None` before construction.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// Discriminant for every event the replay engine understands.
///
/// The textual form is the upper snake case name used in event logs
/// (`PROC_START`, `TRANSPORT_END`, ...) and parsing is case-sensitive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    // -- Queue --
    QueueIn,
    QueueOut,

    // -- Processing --
    ProcStart,
    ProcEnd,
    ProcComplete,

    // -- Breakdowns --
    BreakdownStart,
    BreakdownEnd,
    BreakdownClear,

    // -- Transport --
    TransportStart,
    TransportEnd,
    TransportCancel,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 11] = [
        EventKind::QueueIn,
        EventKind::QueueOut,
        EventKind::ProcStart,
        EventKind::ProcEnd,
        EventKind::ProcComplete,
        EventKind::BreakdownStart,
        EventKind::BreakdownEnd,
        EventKind::BreakdownClear,
        EventKind::TransportStart,
        EventKind::TransportEnd,
        EventKind::TransportCancel,
    ];

    /// The log representation of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::QueueIn => "QUEUE_IN",
            EventKind::QueueOut => "QUEUE_OUT",
            EventKind::ProcStart => "PROC_START",
            EventKind::ProcEnd => "PROC_END",
            EventKind::ProcComplete => "PROC_COMPLETE",
            EventKind::BreakdownStart => "BREAKDOWN_START",
            EventKind::BreakdownEnd => "BREAKDOWN_END",
            EventKind::BreakdownClear => "BREAKDOWN_CLEAR",
            EventKind::TransportStart => "TRANSPORT_START",
            EventKind::TransportEnd => "TRANSPORT_END",
            EventKind::TransportCancel => "TRANSPORT_CANCEL",
        }
    }

    /// Whether this kind is handled by the transport registry.
    pub fn is_transport(self) -> bool {
        matches!(
            self,
            EventKind::TransportStart | EventKind::TransportEnd | EventKind::TransportCancel
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known [`EventKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind '{0}'")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Event record
// ---------------------------------------------------------------------------

/// One machine or transport event, timestamped in simulation minutes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Event {
    /// Simulation time in minutes.
    pub time: f64,
    /// Wall-clock label from the source, carried through untouched.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Machine the event belongs to. Empty for pure transport events.
    #[serde(default)]
    pub machine: String,
    pub kind: EventKind,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub entity_id: String,
    #[serde(default)]
    pub from_machine: Option<String>,
    #[serde(default)]
    pub to_machine: Option<String>,
    /// Absolute queue depth reported with the event, if any.
    #[serde(default)]
    pub queue_length: Option<i64>,
}

impl Event {
    /// An event with only a time, machine and kind set.
    pub fn new(time: f64, machine: impl Into<String>, kind: EventKind) -> Self {
        Self {
            time,
            timestamp: None,
            machine: machine.into(),
            kind,
            product_id: String::new(),
            entity_id: String::new(),
            from_machine: None,
            to_machine: None,
            queue_length: None,
        }
    }

    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = product_id.into();
        self
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = entity_id.into();
        self
    }

    pub fn with_from(mut self, machine: impl Into<String>) -> Self {
        self.from_machine = Some(machine.into());
        self
    }

    pub fn with_to(mut self, machine: impl Into<String>) -> Self {
        self.to_machine = Some(machine.into());
        self
    }

    pub fn with_queue_length(mut self, queue_length: i64) -> Self {
        self.queue_length = Some(queue_length);
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// The machine id, or `None` when the event is not tied to a machine.
    pub fn machine_id(&self) -> Option<&str> {
        non_empty(Some(self.machine.as_str()))
    }
}

/// Treat an empty string the same as a missing one.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_log_name() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
    }

    #[test]
    fn kind_parsing_is_case_sensitive() {
        assert_eq!(
            "proc_start".parse::<EventKind>(),
            Err(UnknownEventKind("proc_start".to_string()))
        );
        assert!("ARRIVAL".parse::<EventKind>().is_err());
    }

    #[test]
    fn serde_name_matches_log_name() {
        let json = serde_json::to_string(&EventKind::BreakdownClear).unwrap();
        assert_eq!(json, "\"BREAKDOWN_CLEAR\"");
    }

    #[test]
    fn only_transport_kinds_are_transport() {
        let transport: Vec<_> = EventKind::ALL
            .into_iter()
            .filter(|k| k.is_transport())
            .collect();
        assert_eq!(
            transport,
            vec![
                EventKind::TransportStart,
                EventKind::TransportEnd,
                EventKind::TransportCancel
            ]
        );
    }

    #[test]
    fn empty_machine_has_no_id() {
        let ev = Event::new(1.0, "", EventKind::TransportStart);
        assert_eq!(ev.machine_id(), None);
        let ev = Event::new(1.0, "M1", EventKind::QueueIn);
        assert_eq!(ev.machine_id(), Some("M1"));
    }
}
