#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use secrecy::SecretString;
use taskvault_core::crypto::KdfParams;
use taskvault_core::{BiometricGate, DataStore, StoreConfig};

pub fn cheap_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        ..KdfParams::default()
    }
}

pub fn open_store(dir: &Path) -> DataStore {
    DataStore::open(StoreConfig::in_dir(dir).with_kdf_defaults(cheap_kdf()))
        .expect("open should succeed")
}

pub fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

/// Gate that answers every prompt the same way and counts prompts.
#[derive(Clone)]
pub struct ScriptedGate {
    pub available: bool,
    pub confirm: bool,
    pub prompts: Arc<AtomicUsize>,
}

impl ScriptedGate {
    pub fn confirming() -> Self {
        Self {
            available: true,
            confirm: true,
            prompts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn cancelling() -> Self {
        Self {
            available: true,
            confirm: false,
            prompts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Like a session with no terminal: the prompt cannot be shown.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::confirming()
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl BiometricGate for ScriptedGate {
    fn is_available(&self) -> bool {
        self.available
    }

    fn prompt_and_confirm(&self, _reason: &str) -> taskvault_core::Result<bool> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        Ok(self.confirm)
    }
}

/// Snapshot of every file in the data directory.
pub fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = std::fs::read_dir(dir)
        .expect("read_dir should succeed")
        .flatten()
        .map(|entry| {
            (
                entry.file_name().to_string_lossy().into_owned(),
                std::fs::read(entry.path()).expect("read should succeed"),
            )
        })
        .collect();
    files.sort();
    files
}
