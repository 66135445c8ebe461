//! File-backed sources for the replay engine: CSV event logs, binary log
//! archives, product timelines and the `shopfloor` configuration file.

pub mod config;
pub mod events;
pub mod loader;
pub mod timeline;

pub use config::{ConfigError, DataConfig, ShopfloorConfig, load_config};
pub use events::{LoadReport, read_events, sniff_delimiter};
pub use loader::{DataLoadError, SourceFormat, load_event_log, write_archive};
pub use timeline::{TimelineRow, load_product_timeline, read_timeline};
