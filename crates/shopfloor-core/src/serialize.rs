//! Binary archive format for event logs.
//!
//! Parsing a large delimited event file is far slower than decoding it, so a
//! log can be written once as a compact `bitcode` archive with a versioned
//! header and reloaded directly. Decoded events go back through
//! [`EventLog::new`], so an archive can never produce an invalid log.

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::log::{EventLog, LogError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying an event log archive.
pub const ARCHIVE_MAGIC: u32 = 0x5F10_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", ARCHIVE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("archive from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("archived events do not form a valid log: {0}")]
    InvalidLog(#[from] LogError),
}

// ---------------------------------------------------------------------------
// Archive header
// ---------------------------------------------------------------------------

/// Header stored in front of the archived events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveHeader {
    pub magic: u32,
    pub version: u32,
}

impl ArchiveHeader {
    pub fn new() -> Self {
        Self {
            magic: ARCHIVE_MAGIC,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != ARCHIVE_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for ArchiveHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LogArchive {
    header: ArchiveHeader,
    events: Vec<Event>,
}

// ---------------------------------------------------------------------------
// EventLog integration
// ---------------------------------------------------------------------------

impl EventLog {
    /// Encode the sorted events with an archive header.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        let archive = LogArchive {
            header: ArchiveHeader::new(),
            events: self.events().to_vec(),
        };
        bitcode::serialize(&archive).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Decode and validate an archive written by [`EventLog::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, DeserializeError> {
        let archive: LogArchive =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        archive.header.validate()?;
        Ok(EventLog::new(archive.events)?)
    }
}
