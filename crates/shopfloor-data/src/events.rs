//! CSV machine-event reader.
//!
//! The reader is header driven: columns are located by name (with a few
//! accepted aliases), so exports with extra or reordered columns load
//! unchanged. Rows that cannot become an [`Event`] are skipped and counted in
//! the [`LoadReport`] instead of failing the whole file.

use std::collections::BTreeMap;
use std::io::Read;

use csv::StringRecord;
use shopfloor_core::event::{Event, EventKind};
use shopfloor_core::log::{EventLog, LogError};
use tracing::{debug, warn};

use crate::loader::DataLoadError;

/// Delimiters considered by [`sniff_delimiter`], in tie-break order.
pub const CSV_DELIMITERS: [u8; 3] = [b',', b'\t', b';'];

// ===========================================================================
// Delimiter detection
// ===========================================================================

/// Pick the delimiter that occurs most often in the header line of `sample`.
///
/// Ties go to the earlier entry of [`CSV_DELIMITERS`]; a header containing
/// none of them is read as comma separated.
pub fn sniff_delimiter(sample: &[u8]) -> u8 {
    let header = sample.split(|&b| b == b'\n').next().unwrap_or_default();
    CSV_DELIMITERS
        .iter()
        .rev()
        .map(|&d| (d, header.iter().filter(|&&b| b == d).count()))
        .filter(|&(_, n)| n > 0)
        .max_by_key(|&(_, n)| n)
        .map_or(b',', |(d, _)| d)
}

// ===========================================================================
// Column mapping
// ===========================================================================

/// All header positions that may hold one logical column. The first
/// non-empty cell wins for each row.
#[derive(Debug, Default)]
pub(crate) struct Column(Vec<usize>);

impl Column {
    pub(crate) fn find(headers: &StringRecord, aliases: &[&str]) -> Self {
        let mut positions = Vec::new();
        for alias in aliases {
            positions.extend(
                headers
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| h.trim() == *alias)
                    .map(|(i, _)| i),
            );
        }
        Self(positions)
    }

    pub(crate) fn is_missing(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn get<'r>(&self, record: &'r StringRecord) -> Option<&'r str> {
        self.0
            .iter()
            .filter_map(|&i| record.get(i))
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    pub(crate) fn get_string(&self, record: &StringRecord) -> Option<String> {
        self.get(record).map(str::to_string)
    }
}

#[derive(Debug)]
struct Columns {
    time: Column,
    timestamp: Column,
    machine: Column,
    event: Column,
    product_id: Column,
    entity_id: Column,
    from_machine: Column,
    to_machine: Column,
    queue_length: Column,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, DataLoadError> {
        let columns = Self {
            time: Column::find(headers, &["time_min", "time"]),
            timestamp: Column::find(headers, &["time_ts"]),
            machine: Column::find(headers, &["machine"]),
            event: Column::find(headers, &["event"]),
            product_id: Column::find(headers, &["product_id"]),
            entity_id: Column::find(headers, &["entity_id"]),
            from_machine: Column::find(headers, &["from_machine", "fromMachine"]),
            to_machine: Column::find(headers, &["to_machine", "toMachine"]),
            queue_length: Column::find(headers, &["q_len", "queue_length"]),
        };
        if columns.time.is_missing() {
            return Err(DataLoadError::MissingColumn("time_min"));
        }
        if columns.event.is_missing() {
            return Err(DataLoadError::MissingColumn("event"));
        }
        Ok(columns)
    }
}

// ===========================================================================
// Row parsing
// ===========================================================================

/// Why a row did not produce an event.
#[derive(Debug, PartialEq)]
enum Rejected {
    BadTime,
    UnknownKind(String),
}

pub(crate) fn parse_time(raw: Option<&str>) -> Option<f64> {
    raw?.parse::<f64>().ok().filter(|t| t.is_finite())
}

/// Queue depths are sometimes exported as floats ("3.0"); truncate them.
fn parse_queue_length(raw: Option<&str>) -> Option<i64> {
    raw?.parse::<f64>()
        .ok()
        .filter(|q| q.is_finite())
        .map(|q| q.trunc() as i64)
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<Event, Rejected> {
    let time = parse_time(columns.time.get(record)).ok_or(Rejected::BadTime)?;
    let raw_kind = columns.event.get(record).unwrap_or_default();
    let kind: EventKind = raw_kind
        .parse()
        .map_err(|_| Rejected::UnknownKind(raw_kind.to_string()))?;

    Ok(Event {
        time,
        timestamp: columns.timestamp.get_string(record),
        machine: columns.machine.get_string(record).unwrap_or_default(),
        kind,
        product_id: columns.product_id.get_string(record).unwrap_or_default(),
        entity_id: columns.entity_id.get_string(record).unwrap_or_default(),
        from_machine: columns.from_machine.get_string(record),
        to_machine: columns.to_machine.get_string(record),
        queue_length: parse_queue_length(columns.queue_length.get(record)),
    })
}

// ===========================================================================
// Reader
// ===========================================================================

/// Result of reading one CSV source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Parsed events in file order.
    pub events: Vec<Event>,
    /// Rows dropped because their time was missing or not a finite number.
    pub skipped_rows: usize,
    /// Rows dropped per unrecognized event kind.
    pub unknown_kinds: BTreeMap<String, usize>,
}

impl LoadReport {
    /// Total number of rows that did not become events.
    pub fn rejected_rows(&self) -> usize {
        self.skipped_rows + self.unknown_kinds.values().sum::<usize>()
    }

    /// Sort the events into a replayable log.
    pub fn into_log(self) -> Result<EventLog, LogError> {
        EventLog::new(self.events)
    }
}

/// Read machine events from CSV text separated by `delimiter`.
pub fn read_events<R: Read>(reader: R, delimiter: u8) -> Result<LoadReport, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::resolve(reader.headers()?)?;
    let mut report = LoadReport::default();

    for result in reader.records() {
        let record = result?;
        match parse_row(&record, &columns) {
            Ok(event) => report.events.push(event),
            Err(Rejected::BadTime) => report.skipped_rows += 1,
            Err(Rejected::UnknownKind(kind)) => {
                *report.unknown_kinds.entry(kind).or_default() += 1;
            }
        }
    }

    if report.skipped_rows > 0 {
        warn!(rows = report.skipped_rows, "skipped rows without a usable time");
    }
    for (kind, rows) in &report.unknown_kinds {
        warn!(kind = %kind, rows, "skipped rows with unknown event kind");
    }
    debug!(events = report.events.len(), "read machine events");

    Ok(report)
}
