//! Everything a command needs, opened once per invocation

use anyhow::{Context, Result};
use fabletime_config::{Config, ConfigError, ConfigManager};
use fabletime_core::{Catalog, StaticCatalog, Story, StoryId};
use fabletime_store::{JsonFileStore, UserLibrary};
use std::path::PathBuf;
use std::sync::Arc;

pub struct AppContext {
    pub manager: ConfigManager,
    pub config: Config,
    pub data_dir: PathBuf,
    pub catalog: Arc<StaticCatalog>,
    pub library: Arc<UserLibrary>,
}

pub fn config_manager(config_dir: Option<PathBuf>) -> Result<ConfigManager> {
    let manager = match config_dir {
        Some(dir) => ConfigManager::with_directory(dir),
        None => ConfigManager::new(),
    };
    manager.context("Failed to locate the config directory")
}

/// Loads the config with env overrides; a broken file yields defaults plus the error
pub fn load_config(manager: &ConfigManager) -> (Config, Option<ConfigError>) {
    match manager.load_with_env_overrides() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    }
}

impl AppContext {
    /// Opens the catalog and the user library
    ///
    /// `data_dir` overrides `app.data_dir` from the config.
    pub fn open(manager: ConfigManager, config: Config, data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => manager
                .data_dir(&config)
                .context("Failed to locate the data directory")?,
        };

        let catalog = match &config.app.catalog_path {
            Some(path) => StaticCatalog::from_json_file(path).map_err(|e| {
                log::error!("Failed to load catalog from {}: {}", path.display(), e);
                anyhow::anyhow!("{} ({})", e.user_message(), path.display())
            })?,
            None => StaticCatalog::builtin(),
        };

        let store_path = config.storage.store_path(&data_dir);
        let store = JsonFileStore::open(&store_path)
            .with_context(|| format!("Failed to open library at {}", store_path.display()))?;

        log::debug!(
            "Opened {} stories, library at {}",
            catalog.len(),
            store_path.display()
        );

        Ok(Self {
            manager,
            config,
            data_dir,
            catalog: Arc::new(catalog),
            library: Arc::new(UserLibrary::new(Arc::new(store))),
        })
    }

    pub fn recordings_dir(&self) -> PathBuf {
        self.config.storage.recordings_path(&self.data_dir)
    }

    /// Looks up a story by id, failing with a readable message
    pub fn story(&self, id: &str) -> Result<&Story> {
        self.catalog
            .story(&StoryId::new(id))
            .with_context(|| format!("No story with id '{}'. Try 'fabletime list'.", id))
    }
}
