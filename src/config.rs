//! Application configuration storage

use crate::error::{AutofillError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "profile-autofill";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Profile store location; defaults to `profiles.json` next to the config
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn resolved_store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("profiles.json")),
        }
    }

    /// Override the given settings, keeping the rest
    pub fn update(&mut self, store_path: Option<PathBuf>, log_level: Option<String>) {
        if let Some(path) = store_path {
            self.store_path = Some(path);
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
    }

    /// Parsed log level, falling back to INFO for unknown names
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| AutofillError::Config("config directory not found".to_string()))?;
    Ok(base.join(APP_DIR))
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Load the user's config, defaults when none was saved
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path()?)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(&config_path()?, config)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| AutofillError::Config(e.to_string()))?;

    serde_json::from_str(&content).map_err(|e| AutofillError::Config(e.to_string()))
}

/// Write `config` to `path`, creating its directory on first save
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| AutofillError::Config(e.to_string()))?;
    }

    let content =
        serde_json::to_string_pretty(config).map_err(|e| AutofillError::Config(e.to_string()))?;

    fs::write(path, content).map_err(|e| AutofillError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());

        let config: AppConfig = serde_json::from_str(r#"{"store_path":"/tmp/p.json"}"#).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(
            config.resolved_store_path().unwrap(),
            PathBuf::from("/tmp/p.json")
        );
    }

    #[test]
    fn test_tracing_level() {
        let mut config = AppConfig::default();
        assert_eq!(config.tracing_level(), tracing::Level::INFO);

        config.log_level = "debug".to_string();
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);

        config.log_level = "chatty".to_string();
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_update_then_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile-autofill").join("config.json");
        assert_eq!(load_config_from(&path).unwrap(), AppConfig::default());

        let mut config = AppConfig::default();
        config.update(Some(PathBuf::from("/data/profiles.json")), None);
        save_config_to(&path, &config).unwrap();

        let mut reloaded = load_config_from(&path).unwrap();
        assert_eq!(reloaded, config);

        reloaded.update(None, Some("debug".to_string()));
        assert_eq!(reloaded.store_path, Some(PathBuf::from("/data/profiles.json")));
        assert_eq!(reloaded.tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_corrupt_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(load_config_from(&path), Err(AutofillError::Config(_))));
    }
}
