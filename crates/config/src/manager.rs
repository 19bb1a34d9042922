//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use fabletime_core::AutoPlayMode;
use std::path::PathBuf;
use std::str::FromStr;

const ENV_PREFIX: &str = "FABLETIME_";

/// Loads, saves and locates the Fabletime configuration
///
/// Platform directories:
/// - Linux: `~/.config/fabletime/`
/// - macOS: `~/Library/Application Support/fabletime/`
/// - Windows: `%APPDATA%\fabletime\`
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a config manager using the platform config directory
    pub fn new() -> ConfigResult<Self> {
        let config_dir = project_dirs()?.config_dir().to_path_buf();
        Self::with_directory(config_dir)
    }

    /// Creates a config manager with a custom config directory
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let persistence = ConfigPersistence::new(config_dir.join("config.toml"));

        Ok(Self {
            persistence,
            config_dir,
        })
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Where the user library and recordings live
    ///
    /// `app.data_dir` wins; otherwise the platform data directory.
    pub fn data_dir(&self, config: &Config) -> ConfigResult<PathBuf> {
        match &config.app.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }

    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads the config, applies `update_fn` and saves the result
    ///
    /// ```rust,no_run
    /// # use fabletime_config::ConfigManager;
    /// # let manager = ConfigManager::new().unwrap();
    /// manager.update(|config| {
    ///     config.narration.speech_rate = 1.0;
    /// }).expect("Failed to update config");
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if none exists
    ///
    /// Returns `Ok(true)` when a file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Validates the config file, returning each problem as a message
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the config and applies `FABLETIME_<SECTION>_<FIELD>` variables
    ///
    /// Example: `FABLETIME_NARRATION_SPEECH_RATE=1.0`
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, std::env::vars())?;

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }

        Ok(config)
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("", "", "fabletime").ok_or_else(|| ConfigError::NoConfigDir {
        reason: "Could not determine user home directory".to_string(),
    })
}

/// Applies recognised overrides from `vars`; unrelated variables are ignored
pub(crate) fn apply_env_overrides<I>(config: &mut Config, vars: I) -> ConfigResult<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(field) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };

        match field {
            "APP_LOG_LEVEL" => config.app.log_level = parse::<LogLevel>(&key, &value)?,
            "APP_DATA_DIR" => config.app.data_dir = Some(PathBuf::from(value)),
            "APP_CATALOG_PATH" => config.app.catalog_path = Some(PathBuf::from(value)),
            "NARRATION_LANGUAGE" => config.narration.language = value,
            "NARRATION_SPEECH_RATE" => config.narration.speech_rate = parse(&key, &value)?,
            "NARRATION_WORDS_PER_MINUTE" => {
                config.narration.words_per_minute = parse(&key, &value)?
            }
            "NARRATION_DEFAULT_AUTO_PLAY" => {
                config.narration.default_auto_play = parse::<AutoPlayMode>(&key, &value)?
            }
            "STORAGE_STORE_FILE" => config.storage.store_file = PathBuf::from(value),
            "STORAGE_RECORDINGS_DIR" => config.storage.recordings_dir = PathBuf::from(value),
            _ => {
                log::debug!("Ignoring unknown override {}", key);
                continue;
            }
        }
        log::info!("Applied config override from {}", key);
    }
    Ok(())
}

fn parse<T>(variable: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::EnvOverride {
            variable: variable.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_load_or_default_with_corrupt_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[narration\n").expect("write");
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();

        manager
            .update(|config| config.narration.words_per_minute = 200)
            .expect("Should update");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded.narration.words_per_minute, 200);
    }

    #[test]
    fn test_initialize_only_once() {
        let (_temp_dir, manager) = setup_test_manager();

        assert!(manager.initialize().expect("Should initialize"));
        assert!(manager.config_path().exists());
        assert!(!manager.initialize().expect("Should initialize"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.narration.language = "en-GB".to_string();
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");
        assert_eq!(manager.load().expect("Should load"), Config::default());
    }

    #[test]
    fn test_data_dir_prefers_configured_value() {
        let (temp_dir, manager) = setup_test_manager();
        let mut config = Config::default();
        config.app.data_dir = Some(temp_dir.path().join("data"));

        assert_eq!(
            manager.data_dir(&config).expect("data dir"),
            temp_dir.path().join("data")
        );
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            vars(&[
                ("FABLETIME_NARRATION_SPEECH_RATE", "1.1"),
                ("FABLETIME_NARRATION_DEFAULT_AUTO_PLAY", "shuffle"),
                ("FABLETIME_APP_LOG_LEVEL", "debug"),
                ("FABLETIME_STORAGE_RECORDINGS_DIR", "/tmp/voice"),
                ("HOME", "/root"),
            ]),
        )
        .expect("overrides");

        assert_eq!(config.narration.speech_rate, 1.1);
        assert_eq!(config.narration.default_auto_play, AutoPlayMode::Shuffle);
        assert_eq!(config.app.log_level, LogLevel::Debug);
        assert_eq!(config.storage.recordings_dir, PathBuf::from("/tmp/voice"));
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = Config::default();
        let result = apply_env_overrides(
            &mut config,
            vars(&[("FABLETIME_NARRATION_SPEECH_RATE", "fast")]),
        );

        assert!(matches!(result, Err(ConfigError::EnvOverride { .. })));
        assert_eq!(config.narration.speech_rate, 0.85);
    }

    #[test]
    fn test_unknown_override_is_ignored() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, vars(&[("FABLETIME_PLAYER_VOLUME", "80")]))
            .expect("overrides");
        assert_eq!(config, Config::default());
    }
}
