//! Portable backups of both datasets.
//!
//! A backup carries each dataset exactly as it sits on disk: envelopes are
//! copied verbatim, so exporting never needs the key. Importing an encrypted
//! backup writes the envelopes back verbatim and restores the backup's KDF
//! settings (including the salt), so the original secret unlocks it again.
//! Plaintext backups go through the normal write path and pick up the live
//! encryption setting.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::crypto::{SessionKey, StoredDocument};
use crate::error::{Result, VaultError};
use crate::fs::{read_optional, remove_if_exists, write_atomic};
use crate::session::SessionLock;
use crate::settings::Settings;
use crate::storage::{DataStore, Dataset, DatasetKind};

/// Current backup format version.
pub const BACKUP_VERSION: u32 = 1;

/// Raw dataset documents inside a backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupBlob {
    /// The Active dataset: an envelope or a plaintext dataset
    pub current: Value,
    /// The Archive dataset, absent when none was ever written
    #[serde(default)]
    pub archive: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: u32,
    #[serde(default)]
    pub encryption_enabled: bool,
    #[serde(default)]
    pub settings: Option<Settings>,
    pub blob: BackupBlob,
}

impl BackupDocument {
    /// Parse and validate a backup document.
    ///
    /// # Errors
    ///
    /// `VaultError::InvalidBackup` if `version` or `blob` is missing, the
    /// version is unsupported, or any part is malformed.
    pub fn from_value(value: Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| VaultError::InvalidBackup("not a JSON object".to_string()))?;
        for field in ["version", "blob"] {
            if object.get(field).map_or(true, Value::is_null) {
                return Err(VaultError::InvalidBackup(format!("missing \"{}\"", field)));
            }
        }

        let document: BackupDocument =
            serde_json::from_value(value).map_err(|e| VaultError::InvalidBackup(e.to_string()))?;
        if document.version == 0 || document.version > BACKUP_VERSION {
            return Err(VaultError::InvalidBackup(format!(
                "unsupported version {}",
                document.version
            )));
        }
        Ok(document)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| VaultError::InvalidBackup(e.to_string()))?;
        Self::from_value(value)
    }
}

/// What an import left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Envelopes restored verbatim; the session is locked and needs the backup's secret.
    Encrypted,
    /// Plaintext restored under the current encryption setting.
    Plaintext,
}

/// One blob, checked before anything is written.
enum ParsedBlob {
    Envelope(Value),
    Plain(Dataset),
}

impl ParsedBlob {
    fn parse(value: Value, label: &str) -> Result<Self> {
        let invalid = |e: String| VaultError::InvalidBackup(format!("{} blob: {}", label, e));
        match StoredDocument::from_value(value.clone()).map_err(|e| invalid(e.to_string()))? {
            StoredDocument::Encrypted(_) => Ok(ParsedBlob::Envelope(value)),
            StoredDocument::Plain(value) => {
                let mut dataset: Dataset =
                    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
                dataset.normalize();
                Ok(ParsedBlob::Plain(dataset))
            }
        }
    }

    fn is_envelope(&self) -> bool {
        matches!(self, ParsedBlob::Envelope(_))
    }
}

fn read_value(path: &Path) -> Result<Option<Value>> {
    match read_optional(path)? {
        Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            VaultError::Storage(format!("Corrupt document {}: {}", path.display(), e))
        }),
        None => Ok(None),
    }
}

/// Snapshot both datasets as they are on disk. Needs no key.
///
/// A missing Active file is exported as a fresh dataset.
pub fn export_backup(store: &DataStore) -> Result<BackupDocument> {
    let settings = store.settings()?;
    let paths = store.paths();

    let current = match read_value(&paths.db)? {
        Some(value) => value,
        None => serde_json::to_value(Dataset::new_active(chrono::Utc::now()))?,
    };
    let archive = read_value(&paths.archive)?;

    Ok(BackupDocument {
        version: BACKUP_VERSION,
        encryption_enabled: settings.encryption_enabled,
        settings: Some(settings),
        blob: BackupBlob { current, archive },
    })
}

/// Restore a backup over the current data.
///
/// Every blob is validated before the first write. Importing replaces the
/// Archive too: a backup without one removes the existing Archive file.
///
/// # Errors
///
/// - `InvalidBackup` if a blob is malformed
/// - `Locked` if a plaintext backup is imported while encryption is enabled
///   and the session is locked
pub fn import_backup(
    store: &DataStore,
    session: &mut SessionLock,
    document: BackupDocument,
) -> Result<ImportOutcome> {
    let current = ParsedBlob::parse(document.blob.current, "current")?;
    let archive = document
        .blob
        .archive
        .filter(|value| !value.is_null())
        .map(|value| ParsedBlob::parse(value, "archive"))
        .transpose()?;

    let encrypted = current.is_envelope() || archive.as_ref().is_some_and(ParsedBlob::is_envelope);
    if encrypted {
        let mut settings = match document.settings {
            Some(settings) => settings,
            None => store.settings()?,
        };
        if settings.kdf_params.salt.is_none() {
            return Err(VaultError::InvalidBackup(
                "encrypted backup carries no KDF salt".to_string(),
            ));
        }
        settings.encryption_enabled = true;
        settings.use_biometrics = false;

        session.invalidate();
        store.save_settings(&settings)?;
        write_blob(store, DatasetKind::Active, current, None)?;
        match archive {
            Some(archive) => write_blob(store, DatasetKind::Archive, archive, None)?,
            None => remove_if_exists(&store.paths().archive)?,
        }
        info!("restored encrypted backup; unlock required");
        return Ok(ImportOutcome::Encrypted);
    }

    let settings = store.settings()?;
    let key = if settings.encryption_enabled {
        Some(session.key().ok_or(VaultError::Locked)?)
    } else {
        None
    };
    write_blob(store, DatasetKind::Active, current, key)?;
    match archive {
        Some(archive) => write_blob(store, DatasetKind::Archive, archive, key)?,
        None => remove_if_exists(&store.paths().archive)?,
    }
    info!(encrypted = key.is_some(), "restored plaintext backup");
    Ok(ImportOutcome::Plaintext)
}

fn write_blob(
    store: &DataStore,
    kind: DatasetKind,
    blob: ParsedBlob,
    key: Option<&SessionKey>,
) -> Result<()> {
    match blob {
        ParsedBlob::Envelope(value) => store.write_raw(kind, &value),
        ParsedBlob::Plain(dataset) => store.write_dataset(kind, &dataset, key),
    }
}

/// Export and write the backup atomically to `path`.
pub fn export_backup_to(store: &DataStore, path: &Path) -> Result<BackupDocument> {
    let document = export_backup(store)?;
    write_atomic(path, &serde_json::to_vec_pretty(&document)?)?;
    info!(path = %path.display(), "wrote backup");
    Ok(document)
}

/// Read a backup from `path` and import it.
pub fn import_backup_from(
    store: &DataStore,
    session: &mut SessionLock,
    path: &Path,
) -> Result<ImportOutcome> {
    let bytes = read_optional(path)?
        .ok_or_else(|| VaultError::NotFound(format!("backup {}", path.display())))?;
    import_backup(store, session, BackupDocument::from_slice(&bytes)?)
}
