//! Optional `config.toml` and data directory resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use taskvault_core::{StoreConfig, StorePaths};

use crate::constants::{CONFIG_ENV, DEV_DATA_DIR};

/// Optional `config.toml`. Every section and key may be omitted.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskvaultConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub security: SecuritySection,
    #[serde(default)]
    pub app: AppSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub dir: Option<String>,
    pub archive_threshold: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SecuritySection {
    /// Offer the console confirmation prompt in place of a biometric sensor
    #[serde(default = "default_true")]
    pub biometrics_prompt: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            biometrics_prompt: default_true(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppSection {
    #[serde(default)]
    pub mode: AppMode,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    #[default]
    Production,
    Development,
}

/// Resolve the config file path, checking TASKVAULT_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn read_config(path: &Path) -> anyhow::Result<TaskvaultConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

/// Read the config if it exists, defaults otherwise.
pub fn load_config(path: &Path) -> anyhow::Result<TaskvaultConfig> {
    if path.exists() {
        read_config(path)
    } else {
        Ok(TaskvaultConfig::default())
    }
}

/// Pick the data directory.
///
/// Order: `--dir` / `TASKVAULT_DIR`, development mode, `[store] dir`, XDG default.
pub fn resolve_data_dir(dir_flag: Option<&Path>, config: &TaskvaultConfig) -> anyhow::Result<PathBuf> {
    if let Some(dir) = dir_flag {
        return Ok(dir.to_path_buf());
    }
    if config.app.mode == AppMode::Development {
        return Ok(std::env::current_dir()?.join(DEV_DATA_DIR));
    }
    if let Some(dir) = config.store.dir.as_deref().filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    Ok(StorePaths::default_location()?.dir)
}

pub fn store_config(data_dir: PathBuf, config: &TaskvaultConfig) -> StoreConfig {
    let store = StoreConfig::in_dir(data_dir);
    match config.store.archive_threshold {
        Some(threshold) => store.with_archive_threshold(threshold),
        None => store,
    }
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("taskvault"));
        }
    }
    Ok(home_dir()?.join(".config").join("taskvault"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: TaskvaultConfig = toml::from_str("").unwrap();
        assert!(config.store.dir.is_none());
        assert!(config.security.biometrics_prompt);
        assert_eq!(config.app.mode, AppMode::Production);
    }

    #[test]
    fn test_full_config_parses() {
        let config: TaskvaultConfig = toml::from_str(
            "[store]\ndir = \"/data/tasks\"\narchive_threshold = 500\n\n[security]\nbiometrics_prompt = false\n\n[app]\nmode = \"development\"\n",
        )
        .unwrap();
        assert_eq!(config.store.dir.as_deref(), Some("/data/tasks"));
        assert_eq!(config.store.archive_threshold, Some(500));
        assert!(!config.security.biometrics_prompt);
        assert_eq!(config.app.mode, AppMode::Development);
    }

    #[test]
    fn test_dir_flag_wins() {
        let config: TaskvaultConfig =
            toml::from_str("[store]\ndir = \"/from/config\"\n").unwrap();
        let dir = resolve_data_dir(Some(Path::new("/from/flag")), &config).unwrap();
        assert_eq!(dir, PathBuf::from("/from/flag"));
        let dir = resolve_data_dir(None, &config).unwrap();
        assert_eq!(dir, PathBuf::from("/from/config"));
    }

    #[test]
    fn test_store_config_threshold() {
        let config: TaskvaultConfig = toml::from_str("[store]\narchive_threshold = 10\n").unwrap();
        let store = store_config(PathBuf::from("/tmp/x"), &config);
        assert_eq!(store.archive_threshold, 10);
    }
}
