//! Configuration file support for VAT.
//!
//! Settings are stored as versioned JSON. Every field has a serde default so
//! older or partial files keep loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color_utils::parse_color;
use crate::constants::annotation::DEFAULT_KEYPOINT_SIZE;
use crate::constants::interaction::DEBOUNCE_MS;
use crate::model::LabelTable;
use crate::zoom_math::ZoomLimits;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Zoom behaviour
    #[serde(default)]
    pub view: ViewConfig,

    /// Pointer handling
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Label color overrides, `#RRGGBB` or `hsl(h, s%, l%)`
    #[serde(default)]
    pub label_colors: BTreeMap<String, String>,
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Keypoint marker radius in image pixels
    #[serde(default = "default_keypoint_size")]
    pub keypoint_size: f64,

    /// Folder exports are written to; empty for none
    #[serde(default)]
    pub export_folder: String,
}

impl UserPreferences {
    /// The export folder, or `None` if unset.
    pub fn export_dir(&self) -> Option<PathBuf> {
        let folder = self.export_folder.trim();
        (!folder.is_empty()).then(|| PathBuf::from(folder))
    }
}

fn default_keypoint_size() -> f64 {
    DEFAULT_KEYPOINT_SIZE
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            keypoint_size: default_keypoint_size(),
            export_folder: String::new(),
        }
    }
}

/// Zoom section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
}

fn default_zoom_step() -> f64 {
    ZoomLimits::default().step
}

fn default_min_zoom() -> f64 {
    ZoomLimits::default().min
}

fn default_max_zoom() -> f64 {
    ZoomLimits::default().max
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            zoom_step: default_zoom_step(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
        }
    }
}

impl ViewConfig {
    /// Zoom limits, or the defaults if the configured values are unusable.
    pub fn limits(&self) -> ZoomLimits {
        let valid = self.zoom_step.is_finite()
            && self.zoom_step > 1.0
            && self.min_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.max_zoom.is_finite()
            && self.min_zoom <= 1.0
            && self.max_zoom >= 1.0;
        if !valid {
            log::warn!(
                "Invalid zoom settings (step {}, range {}..{}), using defaults",
                self.zoom_step,
                self.min_zoom,
                self.max_zoom
            );
            return ZoomLimits::default();
        }
        ZoomLimits {
            step: self.zoom_step,
            min: self.min_zoom,
            max: self.max_zoom,
        }
    }
}

/// Pointer handling section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Clicks of the same tool closer than this are treated as one
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl InteractionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: UserPreferences::default(),
            view: ViewConfig::default(),
            interaction: InteractionConfig::default(),
            label_colors: BTreeMap::new(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// The default vessel label table with this config's color overrides.
    pub fn label_table(&self) -> LabelTable {
        let mut table = LabelTable::vessels();
        for (label, spec) in &self.label_colors {
            match parse_color(spec) {
                Some(color) => table.set_color(label, color),
                None => log::warn!("Ignoring invalid color '{}' for label '{}'", spec, label),
            }
        }
        table
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "vat-config.json"
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save configuration to a file, creating parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("vat").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("vat")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", path);
                Some(config)
            }
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save(&path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
