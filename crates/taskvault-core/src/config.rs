//! Store configuration and on-disk layout.

use std::path::{Path, PathBuf};

use crate::crypto::KdfParams;
use crate::error::{Result, VaultError};

/// Active task count above which completed tasks move to the archive.
pub const DEFAULT_ARCHIVE_THRESHOLD: usize = 2000;

pub const SETTINGS_FILE: &str = "settings.json";
pub const DB_FILE: &str = "db.json";
pub const ARCHIVE_FILE: &str = "archive.json";

/// Paths of the three persisted documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub dir: PathBuf,
    pub settings: PathBuf,
    pub db: PathBuf,
    pub archive: PathBuf,
}

impl StorePaths {
    /// Standard layout inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            settings: dir.join(SETTINGS_FILE),
            db: dir.join(DB_FILE),
            archive: dir.join(ARCHIVE_FILE),
            dir,
        }
    }

    /// `$XDG_DATA_HOME/taskvault`, or `~/.local/share/taskvault`.
    pub fn default_location() -> Result<Self> {
        Ok(Self::in_dir(xdg_data_dir()?))
    }

    pub fn all_files(&self) -> [&Path; 3] {
        [&self.settings, &self.db, &self.archive]
    }
}

/// Everything a [`DataStore`](crate::storage::DataStore) needs to know up front.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub paths: StorePaths,
    pub archive_threshold: usize,
    /// Cost parameters written into fresh Settings; the salt is added on first enable.
    pub kdf_defaults: KdfParams,
}

impl StoreConfig {
    pub fn new(paths: StorePaths) -> Self {
        Self {
            paths,
            archive_threshold: DEFAULT_ARCHIVE_THRESHOLD,
            kdf_defaults: KdfParams::default(),
        }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(StorePaths::in_dir(dir))
    }

    pub fn with_archive_threshold(mut self, threshold: usize) -> Self {
        self.archive_threshold = threshold;
        self
    }

    pub fn with_kdf_defaults(mut self, params: KdfParams) -> Self {
        self.kdf_defaults = KdfParams { salt: None, ..params };
        self
    }
}

fn xdg_data_dir() -> Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("taskvault"));
        }
    }
    let home = std::env::var("HOME").map_err(|_| {
        VaultError::Storage("HOME is not set; cannot resolve default paths".to_string())
    })?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("taskvault"))
}
