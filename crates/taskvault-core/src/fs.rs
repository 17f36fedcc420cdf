//! Filesystem utilities for atomic operations.
//!
//! Every persisted document goes through [`write_atomic`]: the bytes land in a
//! sibling temp file in the same directory, are synced, and then replace the
//! target with a single rename. A reader (or a crash) observes either the old
//! complete file or the new complete file, never a torn write.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::error::{Result, VaultError};

const TEMP_SUFFIX: &str = ".tmp";

/// Atomically rename the temp file over `destination`.
///
/// `fs::rename` replaces an existing target on every supported platform, so
/// the destination is never removed first. If the rename fails the target is
/// left untouched and the temp file is cleaned up.
pub fn rename_into_place(temp_path: &Path, destination: &Path) -> io::Result<()> {
    fs::rename(temp_path, destination).map_err(|err| {
        let _ = fs::remove_file(temp_path);
        err
    })
}

/// Create the directory (and parents) if missing. Idempotent.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        VaultError::Storage(format!(
            "Failed to create directory {}: {}",
            dir.display(),
            e
        ))
    })
}

/// Write `data` to `path` atomically.
///
/// On failure the original target is left untouched and the temp file is removed.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let temp_path = stage_temp(path, data)?;
    commit_temp(&temp_path, path)?;
    debug!(path = %path.display(), bytes = data.len(), "wrote file");
    Ok(())
}

/// First half of an atomic write: fully write and sync a sibling temp file.
///
/// The target is not touched until [`commit_temp`] runs.
pub fn stage_temp(path: &Path, data: &[u8]) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| VaultError::Storage(format!("Invalid path: {}", path.display())))?;
    ensure_dir(parent)?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| VaultError::Storage(format!("System time error: {}", e)))?
        .as_nanos();
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| VaultError::Storage(format!("Invalid filename: {}", path.display())))?;
    let temp_path = parent.join(format!(".{}.{}{}", filename, nanos, TEMP_SUFFIX));

    let mut file = open_private(&temp_path)
        .map_err(|e| VaultError::Storage(format!("Temp file create failed: {}", e)))?;
    let written = file.write_all(data).and_then(|_| file.sync_all());
    if let Err(e) = written {
        drop(file);
        let _ = fs::remove_file(&temp_path);
        return Err(VaultError::Storage(format!("Temp file write failed: {}", e)));
    }

    Ok(temp_path)
}

/// Second half of an atomic write: rename the staged temp file over the target.
pub fn commit_temp(temp_path: &Path, path: &Path) -> Result<()> {
    rename_into_place(temp_path, path)
        .map_err(|e| VaultError::Storage(format!("Atomic rename failed: {}", e)))
}

/// Read a file, returning `None` if it does not exist.
pub fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => {
            debug!(path = %path.display(), bytes = bytes.len(), "read file");
            Ok(Some(bytes))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(VaultError::Storage(format!(
            "Failed to read {}: {}",
            path.display(),
            err
        ))),
    }
}

/// Remove a file if present. Missing files are not an error.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(VaultError::Storage(format!(
            "Failed to remove {}: {}",
            path.display(),
            err
        ))),
    }
}

/// Remove temp files left behind by writes that never reached the rename.
///
/// Returns how many were removed.
pub fn sweep_temp_files(dir: &Path) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with('.') && name.ends_with(TEMP_SUFFIX)) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(err) => warn!(file = %name, error = %err, "failed to remove stale temp file"),
        }
    }
    removed
}

fn open_private(path: &Path) -> io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
