//! Fabletime configuration
//!
//! Each area of the application owns one config section implementing
//! [`ConfigSection`]. The root [`Config`] is stored as TOML in the platform
//! config directory.
//!
//! - Invalid files fall back to defaults with a warning (`load_or_default`)
//! - Writes go through a temp file and an atomic rename
//! - Nothing in this crate panics on bad input
//!
//! # Example
//!
//! ```rust,no_run
//! use fabletime_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load_or_default();
//! println!("Speech rate: {}", config.narration.speech_rate);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

pub mod app_config;
mod narration_config;
mod storage_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use narration_config::NarrationConfig;
pub use storage_config::StorageConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Speech, auto-play and sleep timer settings
    pub narration: NarrationConfig,

    /// Where the user library and recordings live
    pub storage: StorageConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.narration.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.storage.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.narration.merge(other.narration);
        self.storage.merge(other.storage);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            narration: NarrationConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}
