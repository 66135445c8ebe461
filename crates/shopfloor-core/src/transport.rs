//! Product transports between machines and the registry that matches their
//! START, END and CANCEL events.
//!
//! A transport is opened by `TRANSPORT_START`, completed by `TRANSPORT_END`
//! and dropped by `TRANSPORT_CANCEL`. The three events are correlated only by
//! a [`TransportKey`] derived from the product and entity ids, so an end or
//! cancel whose key matches nothing is silently ignored.
//!
//! Completed transports stay visible for a short grace period and are then
//! evicted when the engine refreshes its active set.

use std::collections::BTreeMap;

use crate::event::{Event, EventKind, non_empty};
use crate::interpolate;

/// How long a completed transport stays visible after its end time.
pub const DEFAULT_GRACE_PERIOD: f64 = 0.1;

// ---------------------------------------------------------------------------
// TransportKey
// ---------------------------------------------------------------------------

/// Identity used to match the events of one transport.
///
/// The product and entity ids are two independent correlation domains. Each
/// side falls back to the other when empty, so an event carrying only one of
/// them still yields a complete key. Two events that populate different ids
/// for the same movement will not match.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TransportKey {
    /// Product id, or the entity id when the product id is empty.
    pub primary: String,
    /// Entity id, or the product id when the entity id is empty.
    pub secondary: String,
}

impl TransportKey {
    /// Fold the two correlation ids into a key.
    pub fn normalize(product_id: &str, entity_id: &str) -> Self {
        let primary = if product_id.is_empty() { entity_id } else { product_id };
        let secondary = if entity_id.is_empty() { product_id } else { entity_id };
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        }
    }

    pub fn of(event: &Event) -> Self {
        Self::normalize(&event.product_id, &event.entity_id)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// A tracked movement of one product between two machines.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transport {
    pub product_id: String,
    pub entity_id: String,
    pub from_machine: Option<String>,
    /// Unset until known from the start event or backfilled by the end event.
    pub to_machine: Option<String>,
    pub start_time: f64,
    /// Unset until the matching end event has been applied.
    pub end_time: Option<f64>,
}

impl Transport {
    fn started_by(event: &Event) -> Self {
        let from = non_empty(event.from_machine.as_deref()).or(event.machine_id());
        Self {
            product_id: event.product_id.clone(),
            entity_id: event.entity_id.clone(),
            from_machine: from.map(str::to_string),
            to_machine: non_empty(event.to_machine.as_deref()).map(str::to_string),
            start_time: event.time,
            end_time: None,
        }
    }

    fn complete(&mut self, event: &Event) {
        if self.to_machine.is_none() {
            self.to_machine = event
                .machine_id()
                .or(non_empty(event.to_machine.as_deref()))
                .map(str::to_string);
        }
        self.end_time = Some(event.time);
    }

    /// Whether the transport completed more than `grace` before `clock`.
    pub fn is_expired(&self, clock: f64, grace: f64) -> bool {
        self.end_time.is_some_and(|end| clock > end + grace)
    }

    /// Fractional progress at `clock`, see [`interpolate::progress`].
    pub fn progress(&self, clock: f64) -> f64 {
        interpolate::progress(self, clock)
    }
}

// ---------------------------------------------------------------------------
// ActiveTransport
// ---------------------------------------------------------------------------

/// An owned copy of a transport as of a refresh, ready for rendering.
///
/// `to_machine` falls back to `from_machine` so a renderer always has a
/// destination to interpolate towards.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActiveTransport {
    pub key: TransportKey,
    pub transport: Transport,
    /// Progress at the refresh time, in `[0, 1]`.
    pub progress: f64,
}

// ---------------------------------------------------------------------------
// TransportRegistry
// ---------------------------------------------------------------------------

/// In-flight and recently completed transports, keyed by [`TransportKey`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportRegistry {
    entries: BTreeMap<TransportKey, Transport>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a transport event. Non-transport kinds are ignored.
    pub(crate) fn apply(&mut self, event: &Event) {
        let key = TransportKey::of(event);
        match event.kind {
            EventKind::TransportStart => {
                self.entries.insert(key, Transport::started_by(event));
            }
            EventKind::TransportEnd => match self.entries.get_mut(&key) {
                Some(transport) => transport.complete(event),
                None => tracing::trace!(
                    time = event.time,
                    primary = %key.primary,
                    secondary = %key.secondary,
                    "transport end without a matching start"
                ),
            },
            EventKind::TransportCancel => {
                self.entries.remove(&key);
            }
            EventKind::QueueIn
            | EventKind::QueueOut
            | EventKind::ProcStart
            | EventKind::ProcEnd
            | EventKind::ProcComplete
            | EventKind::BreakdownStart
            | EventKind::BreakdownEnd
            | EventKind::BreakdownClear => {}
        }
    }

    /// Evict transports that completed more than `grace` before `clock` and
    /// return owned copies of the rest, in key order.
    pub(crate) fn refresh(&mut self, clock: f64, grace: f64) -> Vec<ActiveTransport> {
        self.entries.retain(|_, t| !t.is_expired(clock, grace));
        self.entries
            .iter()
            .map(|(key, t)| {
                let mut transport = t.clone();
                if transport.to_machine.is_none() {
                    transport.to_machine = transport.from_machine.clone();
                }
                let progress = interpolate::progress(&transport, clock);
                ActiveTransport {
                    key: key.clone(),
                    transport,
                    progress,
                }
            })
            .collect()
    }

    pub fn get(&self, key: &TransportKey) -> Option<&Transport> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransportKey, &Transport)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind::*;

    fn key(p: &str, e: &str) -> TransportKey {
        TransportKey::normalize(p, e)
    }

    // -----------------------------------------------------------------------
    // Key normalization
    // -----------------------------------------------------------------------

    #[test]
    fn key_falls_back_to_the_other_id() {
        assert_eq!(
            key("P1", ""),
            TransportKey {
                primary: "P1".into(),
                secondary: "P1".into()
            }
        );
        assert_eq!(
            key("", "E1"),
            TransportKey {
                primary: "E1".into(),
                secondary: "E1".into()
            }
        );
        assert_eq!(
            key("P1", "E1"),
            TransportKey {
                primary: "P1".into(),
                secondary: "E1".into()
            }
        );
    }

    #[test]
    fn inconsistent_ids_do_not_match() {
        // Start carries both ids, end carries only the product id.
        assert_ne!(key("P1", "E1"), key("P1", ""));
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn start_uses_machine_when_from_is_missing() {
        let mut reg = TransportRegistry::new();
        reg.apply(&Event::new(1.0, "M1", TransportStart).with_product("P1"));
        let t = reg.get(&key("P1", "")).unwrap();
        assert_eq!(t.from_machine.as_deref(), Some("M1"));
        assert_eq!(t.to_machine, None);
        assert_eq!(t.start_time, 1.0);
        assert_eq!(t.end_time, None);
    }

    #[test]
    fn explicit_from_wins_over_machine() {
        let mut reg = TransportRegistry::new();
        reg.apply(
            &Event::new(1.0, "AGV", TransportStart)
                .with_product("P1")
                .with_from("M3"),
        );
        let t = reg.get(&key("P1", "")).unwrap();
        assert_eq!(t.from_machine.as_deref(), Some("M3"));
    }

    #[test]
    fn end_backfills_destination_only_when_missing() {
        let mut reg = TransportRegistry::new();
        reg.apply(&Event::new(1.0, "M1", TransportStart).with_product("P1"));
        reg.apply(&Event::new(4.0, "M2", TransportEnd).with_product("P1"));
        let t = reg.get(&key("P1", "")).unwrap();
        assert_eq!(t.to_machine.as_deref(), Some("M2"));
        assert_eq!(t.end_time, Some(4.0));

        reg.apply(
            &Event::new(5.0, "M1", TransportStart)
                .with_product("P2")
                .with_to("M3"),
        );
        reg.apply(&Event::new(6.0, "M9", TransportEnd).with_product("P2"));
        let t = reg.get(&key("P2", "")).unwrap();
        assert_eq!(t.to_machine.as_deref(), Some("M3"));
    }

    #[test]
    fn end_without_machine_uses_event_destination() {
        let mut reg = TransportRegistry::new();
        reg.apply(&Event::new(1.0, "M1", TransportStart).with_entity("E1"));
        reg.apply(
            &Event::new(2.0, "", TransportEnd)
                .with_entity("E1")
                .with_to("M4"),
        );
        assert_eq!(
            reg.get(&key("", "E1")).unwrap().to_machine.as_deref(),
            Some("M4")
        );
    }

    #[test]
    fn unmatched_end_and_cancel_are_no_ops() {
        let mut reg = TransportRegistry::new();
        reg.apply(&Event::new(1.0, "M2", TransportEnd).with_product("P9"));
        reg.apply(&Event::new(1.0, "M2", TransportCancel).with_product("P9"));
        assert!(reg.is_empty());
    }

    #[test]
    fn cancel_removes_entry() {
        let mut reg = TransportRegistry::new();
        reg.apply(&Event::new(1.0, "M1", TransportStart).with_product("P1"));
        reg.apply(&Event::new(2.0, "M1", TransportCancel).with_product("P1"));
        assert!(reg.is_empty());
    }

    #[test]
    fn restart_replaces_entry() {
        let mut reg = TransportRegistry::new();
        reg.apply(&Event::new(1.0, "M1", TransportStart).with_product("P1"));
        reg.apply(&Event::new(2.0, "M2", TransportEnd).with_product("P1"));
        reg.apply(&Event::new(3.0, "M2", TransportStart).with_product("P1"));
        let t = reg.get(&key("P1", "")).unwrap();
        assert_eq!(t.start_time, 3.0);
        assert_eq!(t.end_time, None);
        assert_eq!(t.from_machine.as_deref(), Some("M2"));
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    #[test]
    fn refresh_evicts_after_grace_and_defaults_destination() {
        let mut reg = TransportRegistry::new();
        reg.apply(&Event::new(0.0, "M1", TransportStart).with_product("P1"));
        reg.apply(&Event::new(1.0, "M1", TransportStart).with_product("P2"));
        reg.apply(&Event::new(2.0, "", TransportEnd).with_product("P1"));

        let active = reg.refresh(2.05, DEFAULT_GRACE_PERIOD);
        assert_eq!(active.len(), 2);
        let p2 = &active[1];
        assert_eq!(p2.key, key("P2", ""));
        assert_eq!(p2.transport.to_machine.as_deref(), Some("M1"));
        assert_eq!(p2.progress, 0.0);
        // The registry itself keeps the unresolved destination.
        assert_eq!(reg.get(&key("P2", "")).unwrap().to_machine, None);

        let active = reg.refresh(3.0, DEFAULT_GRACE_PERIOD);
        assert_eq!(active.len(), 1);
        assert!(reg.get(&key("P1", "")).is_none());
    }
}
