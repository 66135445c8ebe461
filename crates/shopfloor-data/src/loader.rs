//! Event log loading: format detection by extension, then either the CSV
//! reader or the binary archive decoder.

use std::path::{Path, PathBuf};

use shopfloor_core::log::{EventLog, LogError};
use shopfloor_core::serialize::{DeserializeError, SerializeError};
use tracing::info;

use crate::events::{LoadReport, read_events, sniff_delimiter};

/// Extension of the binary event log archive.
pub const ARCHIVE_EXTENSION: &str = "sflog";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or writing event logs.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// No event file was configured.
    #[error("machine events path is not configured")]
    NotConfigured,

    /// No product timeline file was configured.
    #[error("product timeline path is not configured")]
    TimelineNotConfigured,

    /// The product timeline has no rows for this entity.
    #[error("product entity not found: {0}")]
    EntityNotFound(i64),

    /// The data file does not exist.
    #[error("data file not found: {0}")]
    NotFound(PathBuf),

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A required CSV column is absent from the header.
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    /// The CSV text could not be tokenized.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The parsed events do not form a log.
    #[error(transparent)]
    Log(#[from] LogError),

    /// The archive could not be decoded.
    #[error(transparent)]
    Archive(#[from] DeserializeError),

    /// The archive could not be encoded.
    #[error(transparent)]
    Encode(#[from] SerializeError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported event log formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text with a header row.
    Csv,
    /// Binary archive written by [`write_archive`].
    Archive,
}

impl SourceFormat {
    /// Detect the format of an event file from its extension.
    pub fn detect(path: &Path) -> Result<Self, DataLoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv" | "tsv" | "txt") => Ok(Self::Csv),
            Some(ARCHIVE_EXTENSION) => Ok(Self::Archive),
            _ => Err(DataLoadError::UnsupportedFormat {
                file: path.to_path_buf(),
            }),
        }
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Read a delimited event file, sniffing the delimiter from its header.
pub fn load_csv(path: &Path) -> Result<LoadReport, DataLoadError> {
    let bytes = std::fs::read(path)?;
    read_events(bytes.as_slice(), sniff_delimiter(&bytes))
}

/// Load an event log from a CSV file or a binary archive.
pub fn load_event_log(path: &Path) -> Result<EventLog, DataLoadError> {
    if !path.is_file() {
        return Err(DataLoadError::NotFound(path.to_path_buf()));
    }

    let log = match SourceFormat::detect(path)? {
        SourceFormat::Csv => {
            let report = load_csv(path)?;
            let rejected = report.rejected_rows();
            let log = report.into_log()?;
            info!(
                path = %path.display(),
                events = log.len(),
                rejected,
                "loaded CSV event log"
            );
            log
        }
        SourceFormat::Archive => {
            let log = EventLog::from_bytes(&std::fs::read(path)?)?;
            info!(path = %path.display(), events = log.len(), "loaded event archive");
            log
        }
    };
    Ok(log)
}

/// Write `log` as a binary archive at `path`.
pub fn write_archive(log: &EventLog, path: &Path) -> Result<(), DataLoadError> {
    std::fs::write(path, log.to_bytes()?)?;
    info!(path = %path.display(), events = log.len(), "wrote event archive");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfloor_core::test_utils::scenario_log;
    use std::fs;

    const SCENARIO_CSV: &str = "time_min,machine,event,product_id,to_machine\n\
        0,M1,PROC_START,,\n\
        5,M1,TRANSPORT_START,P1,M2\n\
        10,M1,PROC_END,,\n\
        15,M2,TRANSPORT_END,P1,\n";

    // -----------------------------------------------------------------------
    // SourceFormat::detect
    // -----------------------------------------------------------------------

    #[test]
    fn detect_text_formats() {
        for name in ["events.csv", "events.tsv", "events.txt", "EVENTS.CSV"] {
            assert_eq!(
                SourceFormat::detect(Path::new(name)).unwrap(),
                SourceFormat::Csv,
                "{name}"
            );
        }
    }

    #[test]
    fn detect_archive() {
        assert_eq!(
            SourceFormat::detect(Path::new("run.sflog")).unwrap(),
            SourceFormat::Archive
        );
    }

    #[test]
    fn detect_unsupported() {
        let err = SourceFormat::detect(Path::new("events.parquet")).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedFormat { .. }));
        assert!(SourceFormat::detect(Path::new("events")).is_err());
    }

    // -----------------------------------------------------------------------
    // load_event_log
    // -----------------------------------------------------------------------

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_event_log(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::NotFound(_)));
    }

    #[test]
    fn loads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        fs::write(&path, SCENARIO_CSV).unwrap();

        let log = load_event_log(&path).unwrap();
        assert_eq!(log.events(), scenario_log().events());
    }

    #[test]
    fn loads_tab_separated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.tsv");
        fs::write(&path, SCENARIO_CSV.replace(',', "\t")).unwrap();

        let log = load_event_log(&path).unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log.machines(), ["M1".to_string(), "M2".to_string()]);
    }

    #[test]
    fn csv_without_events_is_log_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        fs::write(&path, "time_min,machine,event\n1,M1,WARMUP\n").unwrap();

        let err = load_event_log(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::Log(LogError::EmptyLog)));
    }

    #[test]
    fn archive_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.sflog");
        let log = scenario_log();

        write_archive(&log, &path).unwrap();
        let loaded = load_event_log(&path).unwrap();
        assert_eq!(loaded.events(), log.events());
    }

    #[test]
    fn corrupt_archive_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.sflog");
        fs::write(&path, [0u8; 3]).unwrap();

        let err = load_event_log(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::Archive(_)));
    }
}
