//! Storage configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the user library file and saved recordings
///
/// Relative paths are resolved against the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Key-value store holding favorites, preferences and the recordings index
    pub store_file: PathBuf,

    /// Directory for saved voice recordings
    pub recordings_dir: PathBuf,
}

impl StorageConfig {
    /// Absolute store file path under `data_dir`
    pub fn store_path(&self, data_dir: &Path) -> PathBuf {
        resolve(data_dir, &self.store_file)
    }

    /// Absolute recordings directory under `data_dir`
    pub fn recordings_path(&self, data_dir: &Path) -> PathBuf {
        resolve(data_dir, &self.recordings_dir)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_file: PathBuf::from("library.json"),
            recordings_dir: PathBuf::from("recordings"),
        }
    }
}

impl ConfigSection for StorageConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::not_empty(&self.store_file.to_string_lossy(), "storage.store_file"),
            Validator::not_empty(
                &self.recordings_dir.to_string_lossy(),
                "storage.recordings_dir",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.store_file = other.store_file;
        self.recordings_dir = other.recordings_dir;
    }

    fn section_name(&self) -> &'static str {
        "storage"
    }
}
