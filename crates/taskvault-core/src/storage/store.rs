//! The two-dataset persistence engine.
//!
//! A [`DataStore`] owns the data directory. Every read and write goes through
//! it, and every read or write of an envelope needs the key held by the
//! caller's [`SessionLock`]. The store itself never holds a key.

use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::{StoreConfig, StorePaths};
use crate::crypto::{decrypt, encrypt, SessionKey, StoredDocument};
use crate::error::{Result, VaultError};
use crate::fs::{ensure_dir, read_optional, remove_if_exists, sweep_temp_files, write_atomic};
use crate::session::SessionLock;
use crate::settings::Settings;
use crate::storage::archive::migrate_overflow;
use crate::storage::merge::merge;
use crate::storage::types::{Dataset, MergedView, Project, INBOX_ID};

/// Both datasets plus their merged view, as returned by [`DataStore::load`].
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub view: MergedView,
    pub active: Dataset,
    pub archive: Dataset,
}

/// Which persisted dataset a call refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Active,
    Archive,
}

impl DatasetKind {
    pub fn path(self, paths: &StorePaths) -> &Path {
        match self {
            DatasetKind::Active => &paths.db,
            DatasetKind::Archive => &paths.archive,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DatasetKind::Active => "active",
            DatasetKind::Archive => "archive",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataStore {
    config: StoreConfig,
}

impl DataStore {
    /// Open (and create if needed) the data directory.
    ///
    /// Temp files left by interrupted writes are removed.
    pub fn open(config: StoreConfig) -> Result<Self> {
        ensure_dir(&config.paths.dir)?;
        let swept = sweep_temp_files(&config.paths.dir);
        if swept > 0 {
            warn!(count = swept, dir = %config.paths.dir.display(), "removed stale temp files");
        }
        debug!(dir = %config.paths.dir.display(), "opened data store");
        Ok(Self { config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn paths(&self) -> &StorePaths {
        &self.config.paths
    }

    /// Settings on disk, or fresh defaults when none were written yet.
    pub fn settings(&self) -> Result<Settings> {
        let defaults = self.config.kdf_defaults.clone();
        Settings::load_or(&self.config.paths.settings, move || Settings::new(defaults))
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        settings.save(&self.config.paths.settings)
    }

    /// Load both datasets and merge them.
    ///
    /// A missing Active file yields a fresh dataset holding the inbox, which is
    /// written immediately; a missing Archive yields an empty one in memory.
    ///
    /// # Errors
    ///
    /// `VaultError::Locked` if encryption is enabled and the session is locked,
    /// or if either file holds an envelope and no key is available.
    pub fn load(&self, session: &SessionLock) -> Result<LoadedData> {
        let settings = self.settings()?;
        if settings.encryption_enabled && !session.is_unlocked() {
            return Err(VaultError::Locked);
        }
        let key = session.key();

        let (mut active, fresh) = match self.read_dataset(DatasetKind::Active, key)? {
            Some(dataset) => (dataset, false),
            None => (Dataset::new_active(Utc::now()), true),
        };
        let archive = self
            .read_dataset(DatasetKind::Archive, key)?
            .unwrap_or_else(|| Dataset::empty_archive(active.created_at));

        let repaired = ensure_inbox(&mut active, &archive);
        if fresh || repaired {
            self.write_dataset(DatasetKind::Active, &active, self.write_key(&settings, session)?)?;
        }

        Ok(LoadedData {
            view: merge(&active, &archive),
            active,
            archive,
        })
    }

    /// Persist both datasets, migrating overflow to the Archive first.
    ///
    /// The Archive file is only written once it has tasks or already exists.
    /// Returns how many tasks were migrated.
    pub fn save(
        &self,
        session: &SessionLock,
        active: &mut Dataset,
        archive: &mut Dataset,
    ) -> Result<usize> {
        let settings = self.settings()?;
        let key = self.write_key(&settings, session)?;

        let moved = migrate_overflow(active, archive, self.config.archive_threshold);
        if moved > 0 {
            info!(moved, "archived completed tasks");
        }

        self.write_dataset(DatasetKind::Active, active, key)?;
        if !archive.tasks.is_empty() || self.config.paths.archive.exists() {
            self.write_dataset(DatasetKind::Archive, archive, key)?;
        }
        Ok(moved)
    }

    /// Key for writes under the current settings, `None` meaning plaintext.
    fn write_key<'a>(
        &self,
        settings: &Settings,
        session: &'a SessionLock,
    ) -> Result<Option<&'a SessionKey>> {
        if settings.encryption_enabled {
            session.key().map(Some).ok_or(VaultError::Locked)
        } else {
            Ok(None)
        }
    }

    /// Raw classified contents of a dataset file, `None` if absent.
    pub fn read_document(&self, kind: DatasetKind) -> Result<Option<StoredDocument>> {
        let path = kind.path(&self.config.paths);
        match read_optional(path)? {
            Some(bytes) => StoredDocument::parse(&bytes)
                .map(Some)
                .map_err(|e| corrupt(path, e)),
            None => Ok(None),
        }
    }

    /// Read and decode one dataset. Envelopes need `key`.
    pub fn read_dataset(
        &self,
        kind: DatasetKind,
        key: Option<&SessionKey>,
    ) -> Result<Option<Dataset>> {
        let path = kind.path(&self.config.paths);
        let document = match self.read_document(kind)? {
            Some(document) => document,
            None => return Ok(None),
        };

        let mut dataset: Dataset = match document {
            StoredDocument::Plain(value) => {
                serde_json::from_value(value).map_err(|e| corrupt(path, e))?
            }
            StoredDocument::Encrypted(envelope) => {
                let key = key.ok_or(VaultError::Locked)?;
                let plaintext = decrypt(&envelope, key)?;
                serde_json::from_slice(&plaintext).map_err(|e| corrupt(path, e))?
            }
        };
        dataset.normalize();
        Ok(Some(dataset))
    }

    /// Encode and atomically write one dataset; encrypted when `key` is given.
    pub fn write_dataset(
        &self,
        kind: DatasetKind,
        dataset: &Dataset,
        key: Option<&SessionKey>,
    ) -> Result<()> {
        let path = kind.path(&self.config.paths);
        let plaintext = Zeroizing::new(serde_json::to_vec_pretty(dataset)?);
        let bytes = match key {
            Some(key) => serde_json::to_vec_pretty(&encrypt(&plaintext, key)?)?,
            None => plaintext.to_vec(),
        };
        write_atomic(path, &bytes)?;
        debug!(dataset = kind.label(), encrypted = key.is_some(), "saved dataset");
        Ok(())
    }

    /// Write a raw JSON value verbatim (used by backup import).
    pub fn write_raw(&self, kind: DatasetKind, value: &serde_json::Value) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        write_atomic(kind.path(&self.config.paths), &bytes)
    }

    /// Re-encode every existing dataset from one key state to another.
    ///
    /// Absent files stay absent. Used when encryption is switched on or off.
    pub fn reencode_all(&self, from: Option<&SessionKey>, to: Option<&SessionKey>) -> Result<()> {
        for kind in [DatasetKind::Active, DatasetKind::Archive] {
            if let Some(dataset) = self.read_dataset(kind, from)? {
                self.write_dataset(kind, &dataset, to)?;
            }
        }
        Ok(())
    }

    /// Encrypt any dataset still stored as plaintext. Returns how many were rewritten.
    pub fn migrate_plaintext(&self, key: &SessionKey) -> Result<usize> {
        let mut migrated = 0;
        for kind in [DatasetKind::Active, DatasetKind::Archive] {
            if let Some(StoredDocument::Plain(value)) = self.read_document(kind)? {
                let path = kind.path(&self.config.paths);
                let mut dataset: Dataset =
                    serde_json::from_value(value).map_err(|e| corrupt(path, e))?;
                dataset.normalize();
                self.write_dataset(kind, &dataset, Some(key))?;
                info!(dataset = kind.label(), "encrypted legacy plaintext dataset");
                migrated += 1;
            }
        }
        Ok(migrated)
    }

    /// Delete all three documents and write fresh defaults.
    pub fn reset(&self) -> Result<()> {
        for path in self.config.paths.all_files() {
            remove_if_exists(path)?;
        }
        self.save_settings(&Settings::new(self.config.kdf_defaults.clone()))?;
        self.write_dataset(DatasetKind::Active, &Dataset::new_active(Utc::now()), None)?;
        info!(dir = %self.config.paths.dir.display(), "reset data store");
        Ok(())
    }
}

/// Re-create the inbox in Active if neither dataset has it.
fn ensure_inbox(active: &mut Dataset, archive: &Dataset) -> bool {
    let present = active
        .projects
        .iter()
        .chain(archive.projects.iter())
        .any(|project| project.id == INBOX_ID);
    if present {
        return false;
    }
    warn!("inbox project missing; recreating");
    active.projects.insert(0, Project::inbox(active.created_at));
    true
}

fn corrupt(path: &Path, err: impl std::fmt::Display) -> VaultError {
    VaultError::Storage(format!("Corrupt document {}: {}", path.display(), err))
}
