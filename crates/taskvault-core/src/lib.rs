//! # TaskVault Core
//!
//! Core library for TaskVault - a local-first task manager whose data stays
//! encrypted at rest and survives crashes.
//!
//! This crate provides the persistence engine, the session lock, and the
//! project/task model, independent of any user interface.
//!
//! ## Architecture
//!
//! - **crypto**: Argon2id key derivation and AES-256-GCM envelopes
//! - **fs**: Atomic, crash-safe file writes
//! - **escrow**: Session-key escrow behind a biometric gate
//! - **session**: The locked/unlocked state machine and security operations
//! - **storage**: Active/Archive datasets, merging, and overflow migration
//! - **domain**: Project and task mutations
//! - **backup**: Portable backups independent of the live encryption state
//!
//! ## Example
//!
//! ```no_run
//! use secrecy::SecretString;
//! use taskvault_core::{DataStore, MemoryEscrow, NewTask, NoBiometrics, SessionLock, StoreConfig};
//!
//! let store = DataStore::open(StoreConfig::in_dir("/tmp/taskvault"))?;
//! let mut session = SessionLock::new(MemoryEscrow::new(), NoBiometrics);
//!
//! session.enable(&store, &SecretString::from("abcd".to_string()), false)?;
//! store.add_task(&session, NewTask::new("buy milk"))?;
//! session.lock();
//! # Ok::<(), taskvault_core::VaultError>(())
//! ```

pub mod backup;
pub mod config;
pub mod crypto;
pub mod domain;
mod encoding;
pub mod error;
pub mod escrow;
pub mod fs;
pub mod session;
pub mod settings;
pub mod storage;

pub use backup::{
    export_backup, export_backup_to, import_backup, import_backup_from, BackupDocument,
    ImportOutcome,
};
pub use config::{StoreConfig, StorePaths};
pub use error::{Result, VaultError};
pub use escrow::{BiometricGate, KeyEscrow, KeyringEscrow, MemoryEscrow, NoBiometrics};
pub use session::{EnableOutcome, SecurityConfig, SessionLock, UnlockMethod};
pub use settings::Settings;
pub use storage::{
    DataStore, IntegrityReport, IsoDate, LoadedData, MergedView, NewTask, Priority, Project, Task,
    TaskPatch,
};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
