//! Error types for TaskVault core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages. No variant ever carries key material or secrets.

use thiserror::Error;

/// Result type alias for TaskVault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Core error type for TaskVault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Key derivation requested but Settings carry no salt
    #[error("Key derivation parameters have no salt")]
    MissingSalt,

    /// AEAD tag did not verify: tampered data, wrong key, or corruption.
    ///
    /// Intentionally carries no detail so callers cannot tell the causes apart.
    #[error("Authentication failed")]
    Authentication,

    /// Operation touches encrypted data while the session is locked
    #[error("Session is locked")]
    Locked,

    /// Biometric unlock requested but the credential store holds no key
    #[error("No escrowed key available; unlock with your secret to restore it")]
    EscrowKeyMissing,

    /// The supplied secret does not decrypt the active dataset
    #[error("Incorrect secret")]
    WrongSecret,

    /// Unlock requested without a secret and no escrow path is usable
    #[error("A secret is required to unlock")]
    NeedSecret,

    /// Unlock or disable requested while encryption is off
    #[error("Encryption is not enabled")]
    EncryptionDisabled,

    /// Project or task lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Project name collides (case-insensitive) with an existing project
    #[error("A project named \"{0}\" already exists")]
    DuplicateName(String),

    /// Backup document is missing required fields or is malformed
    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    /// Platform credential store refused or is missing
    #[error("Key escrow unavailable: {0}")]
    EscrowUnavailable(String),

    /// Encryption or key derivation error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl VaultError {
    /// True for failures a human resolves by re-entering a secret or retrying biometrics.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            VaultError::WrongSecret
                | VaultError::NeedSecret
                | VaultError::EscrowKeyMissing
                | VaultError::Authentication
        )
    }
}
