//! Configuration management for ibs-tracker.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::trends::Window;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "ibs-tracker";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "journal.db";

/// Store key the journal blob is kept under.
pub const DEFAULT_STORAGE_KEY: &str = "ibs-tracker-data";

/// Application name used in export file names.
pub const DEFAULT_APP_NAME: &str = "ibs-tracker";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `IBS_TRACKER_`)
/// 2. TOML config file at `~/.config/ibs-tracker/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Export configuration.
    pub export: ExportConfig,
    /// Trend view configuration.
    pub trends: TrendsConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/ibs-tracker/journal.db`
    pub database_path: Option<PathBuf>,
    /// Key the journal is stored under.
    pub storage_key: String,
    /// Largest journal blob the store accepts, in bytes.
    /// Set to 0 for unlimited.
    pub max_blob_bytes: usize,
}

/// Export-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Prefix of exported file names.
    pub app_name: String,
    /// Directory exports are written to.
    /// Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
}

/// Trend view configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendsConfig {
    /// Window used when none is given, in days (7, 14 or 30).
    pub default_window: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_blob_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            output_dir: None,
        }
    }
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self { default_window: 7 }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("IBS_TRACKER_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.storage_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage_key must not be empty".to_string(),
            });
        }

        if self.export.app_name.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "app_name must not be empty".to_string(),
            });
        }

        if Window::from_days(self.trends.default_window).is_err() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "default_window must be 7, 14 or 30, got {}",
                    self.trends.default_window
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the default trend window.
    ///
    /// Falls back to seven days if the configured value was never validated.
    #[must_use]
    pub fn default_window(&self) -> Window {
        Window::from_days(self.trends.default_window).unwrap_or_default()
    }
}
