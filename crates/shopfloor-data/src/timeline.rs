//! Per-product timelines.
//!
//! The simulator can export a second CSV with one row per step a product
//! entity goes through. Only `entity_id` and `start_min` have a fixed
//! meaning; every other column is carried through as text so the export's
//! extra columns reach the caller unchanged.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::events::{Column, parse_time, sniff_delimiter};
use crate::loader::DataLoadError;

/// One step of a product's route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub entity_id: i64,
    pub start_min: f64,
    /// Remaining non-empty cells keyed by header name.
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

/// Entity ids are sometimes exported as floats ("7.0").
fn parse_entity_id(raw: Option<&str>) -> Option<i64> {
    let raw = raw?;
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

fn extra_fields(headers: &StringRecord, record: &StringRecord) -> BTreeMap<String, String> {
    headers
        .iter()
        .zip(record.iter())
        .map(|(h, v)| (h.trim(), v.trim()))
        .filter(|(h, v)| !v.is_empty() && *h != "entity_id" && *h != "start_min")
        .map(|(h, v)| (h.to_string(), v.to_string()))
        .collect()
}

/// Read the rows of `entity_id` from timeline CSV text, ordered by start
/// time. Rows without a usable `start_min` are skipped.
pub fn read_timeline<R: Read>(
    reader: R,
    delimiter: u8,
    entity_id: i64,
) -> Result<Vec<TimelineRow>, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let entity = Column::find(&headers, &["entity_id"]);
    if entity.is_missing() {
        return Err(DataLoadError::MissingColumn("entity_id"));
    }
    let start = Column::find(&headers, &["start_min"]);
    if start.is_missing() {
        return Err(DataLoadError::MissingColumn("start_min"));
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result?;
        if parse_entity_id(entity.get(&record)) != Some(entity_id) {
            continue;
        }
        let Some(start_min) = parse_time(start.get(&record)) else {
            skipped += 1;
            continue;
        };
        rows.push(TimelineRow {
            entity_id,
            start_min,
            fields: extra_fields(&headers, &record),
        });
    }

    if skipped > 0 {
        warn!(entity_id, rows = skipped, "skipped timeline rows without a usable start_min");
    }
    rows.sort_by(|a, b| a.start_min.total_cmp(&b.start_min));
    debug!(entity_id, rows = rows.len(), "read product timeline");
    Ok(rows)
}

/// Load the timeline of one product entity from a CSV file.
///
/// An entity with no rows is [`DataLoadError::EntityNotFound`].
pub fn load_product_timeline(
    path: &Path,
    entity_id: i64,
) -> Result<Vec<TimelineRow>, DataLoadError> {
    if !path.is_file() {
        return Err(DataLoadError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let rows = read_timeline(bytes.as_slice(), sniff_delimiter(&bytes), entity_id)?;
    if rows.is_empty() {
        return Err(DataLoadError::EntityNotFound(entity_id));
    }
    info!(path = %path.display(), entity_id, rows = rows.len(), "loaded product timeline");
    Ok(rows)
}
