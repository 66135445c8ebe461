//! The `shopfloor` configuration file.
//!
//! A single TOML or JSON document (format detected from the extension) with
//! three optional sections: `[replay]`, `[playback]` and `[data]`. After
//! loading, environment variables may override the data locations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use shopfloor_core::config::{PlaybackConfig, ReplayConfig};

/// Overrides the directory relative event paths are resolved against.
pub const ENV_DATA_DIR: &str = "SIM_DATA_DIR";
/// Overrides the machine events file.
pub const ENV_EVENTS_PATH: &str = "MACHINE_EVENTS_PATH";
/// Overrides the per-entity product timeline file.
pub const ENV_PRODUCT_TIMELINE_PATH: &str = "PRODUCT_TIMELINE_PATH";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported config format: {file}")]
    UnsupportedFormat { file: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("invalid value in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Config types
// ===========================================================================

/// Where the event data lives.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Base directory for relative paths. Defaults to the working directory.
    pub data_dir: Option<PathBuf>,
    /// Machine events file (CSV or archive).
    pub events_path: Option<PathBuf>,
    /// Product timeline CSV, one row per product step.
    pub product_timeline_path: Option<PathBuf>,
}

impl DataConfig {
    fn resolve(&self, path: Option<&PathBuf>) -> Option<PathBuf> {
        let path = path?;
        match &self.data_dir {
            Some(dir) if path.is_relative() => Some(dir.join(path)),
            _ => Some(path.clone()),
        }
    }

    /// The events file, joined onto `data_dir` when it is relative.
    pub fn resolved_events_path(&self) -> Option<PathBuf> {
        self.resolve(self.events_path.as_ref())
    }

    /// The product timeline file, joined onto `data_dir` when it is relative.
    pub fn resolved_product_timeline_path(&self) -> Option<PathBuf> {
        self.resolve(self.product_timeline_path.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShopfloorConfig {
    pub replay: ReplayConfig,
    pub playback: PlaybackConfig,
    pub data: DataConfig,
}

impl ShopfloorConfig {
    /// Apply `SIM_DATA_DIR`, `MACHINE_EVENTS_PATH` and
    /// `PRODUCT_TIMELINE_PATH` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var_os(key));
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<OsString>) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        if let Some(dir) = var(ENV_DATA_DIR) {
            self.data.data_dir = Some(dir);
        }
        if let Some(path) = var(ENV_EVENTS_PATH) {
            self.data.events_path = Some(path);
        }
        if let Some(path) = var(ENV_PRODUCT_TIMELINE_PATH) {
            self.data.product_timeline_path = Some(path);
        }
    }

    /// Check the numeric tunables. Playback rates must be non-negative so a
    /// player can never be driven backwards.
    pub fn validate(&self) -> Result<(), String> {
        let playback = &self.playback;
        if !(playback.minutes_per_second.is_finite() && playback.minutes_per_second >= 0.0) {
            return Err(format!(
                "playback.minutes_per_second must be a non-negative number, got {}",
                playback.minutes_per_second
            ));
        }
        if !(playback.speed.is_finite() && playback.speed >= 0.0) {
            return Err(format!(
                "playback.speed must be a non-negative number, got {}",
                playback.speed
            ));
        }
        let replay = &self.replay;
        if !(replay.grace_period.is_finite() && replay.grace_period >= 0.0) {
            return Err(format!(
                "replay.grace_period must be a non-negative number, got {}",
                replay.grace_period
            ));
        }
        if !(replay.window_minutes.is_finite() && replay.window_minutes > 0.0) {
            return Err(format!(
                "replay.window_minutes must be a positive number, got {}",
                replay.window_minutes
            ));
        }
        Ok(())
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

/// Detect the format of a config file based on its extension.
pub fn detect_format(path: &Path) -> Result<ConfigFormat, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(ConfigFormat::Toml),
        Some("json") => Ok(ConfigFormat::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Parse and validate config text. `file` is only used in error messages.
pub fn parse_config(
    content: &str,
    format: ConfigFormat,
    file: &Path,
) -> Result<ShopfloorConfig, ConfigError> {
    let parsed: Result<ShopfloorConfig, String> = match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    };
    let config = parsed.map_err(|detail| ConfigError::Parse {
        file: file.to_path_buf(),
        detail,
    })?;
    config.validate().map_err(|detail| ConfigError::Invalid {
        file: file.to_path_buf(),
        detail,
    })?;
    Ok(config)
}

/// Read and parse a config file.
pub fn load_config(path: &Path) -> Result<ShopfloorConfig, ConfigError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, format, path)
}
