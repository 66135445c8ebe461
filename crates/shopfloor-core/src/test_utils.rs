//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::event::{Event, EventKind};
use crate::log::EventLog;

// ===========================================================================
// Event constructors
// ===========================================================================

pub fn ev(time: f64, machine: &str, kind: EventKind) -> Event {
    Event::new(time, machine, kind)
}

pub fn transport_start(time: f64, machine: &str, product: &str, to: Option<&str>) -> Event {
    let event = Event::new(time, machine, EventKind::TransportStart).with_product(product);
    match to {
        Some(to) => event.with_to(to),
        None => event,
    }
}

pub fn transport_end(time: f64, machine: &str, product: &str) -> Event {
    Event::new(time, machine, EventKind::TransportEnd).with_product(product)
}

pub fn transport_cancel(time: f64, machine: &str, product: &str) -> Event {
    Event::new(time, machine, EventKind::TransportCancel).with_product(product)
}

// ===========================================================================
// Logs
// ===========================================================================

/// The reference scenario: one machine processing while it ships P1 to M2.
///
/// ```text
/// t=0   M1 PROC_START
/// t=5   M1 TRANSPORT_START P1 -> M2
/// t=10  M1 PROC_END
/// t=15  M2 TRANSPORT_END P1
/// ```
pub fn scenario_events() -> Vec<Event> {
    vec![
        ev(0.0, "M1", EventKind::ProcStart),
        transport_start(5.0, "M1", "P1", Some("M2")),
        ev(10.0, "M1", EventKind::ProcEnd),
        transport_end(15.0, "M2", "P1"),
    ]
}

pub fn scenario_log() -> EventLog {
    EventLog::new(scenario_events()).expect("scenario log is non-empty")
}

/// The reference scenario followed by a late event at t=30, so the clock can
/// run past the transport's grace period.
pub fn extended_scenario_log() -> EventLog {
    let mut events = scenario_events();
    events.push(ev(30.0, "M1", EventKind::QueueIn));
    EventLog::new(events).expect("scenario log is non-empty")
}

/// A deterministic log of `n` events (n >= 1) at half-minute spacing over
/// four machines, mixing queue, processing, breakdown and transport events.
/// Products are reused so transports restart, complete and cancel under the
/// same keys, and every fifth event shares its timestamp with the previous.
pub fn busy_log(n: usize) -> EventLog {
    const MACHINES: [&str; 4] = ["CUT", "DRILL", "PAINT", "PACK"];
    let mut events = Vec::with_capacity(n);
    let mut time = 0.0;

    for i in 0..n {
        if i % 5 != 0 {
            time += 0.5;
        }
        let machine = MACHINES[i % MACHINES.len()];
        let next = MACHINES[(i + 1) % MACHINES.len()];
        let product = format!("P{}", i % 7);

        let event = match i % 11 {
            0 => ev(time, machine, EventKind::QueueIn),
            1 => ev(time, machine, EventKind::ProcStart),
            2 => transport_start(time, machine, &product, Some(next)),
            3 => ev(time, machine, EventKind::QueueOut),
            4 => ev(time, machine, EventKind::ProcComplete),
            5 => transport_end(time, next, &product),
            6 => ev(time, machine, EventKind::BreakdownStart).with_queue_length(3),
            7 => transport_start(time, machine, &product, None),
            8 => ev(time, machine, EventKind::BreakdownClear),
            9 => transport_cancel(time, machine, &product),
            _ => Event::new(time, "", EventKind::TransportEnd).with_product(product),
        };
        events.push(event);
    }

    EventLog::new(events).expect("busy_log requires n >= 1")
}
