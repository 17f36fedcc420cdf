//! Session-key escrow in a platform credential store.
//!
//! The escrow is a dumb secure key-value slot: it stores the base64-encoded
//! session key under a fixed service/account pair. Gating access behind a
//! biometric prompt is the job of [`BiometricGate`], which the session lock
//! consults before it ever calls [`KeyEscrow::retrieve`].

use std::path::Path;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::crypto::SessionKey;
use crate::error::{Result, VaultError};

/// Service name under which keys are escrowed.
pub const ESCROW_SERVICE: &str = "taskvault";

/// Secure storage for the session key.
pub trait KeyEscrow: Send + Sync {
    /// Whether the backing store can be used on this machine.
    fn is_available(&self) -> bool;

    /// Persist the key, replacing any previous one.
    fn store(&self, key: &SessionKey) -> Result<()>;

    /// Fetch the escrowed key, `Ok(None)` if nothing is stored.
    fn retrieve(&self) -> Result<Option<SessionKey>>;

    /// Delete the escrowed key. Removing a missing key succeeds.
    fn remove(&self) -> Result<()>;
}

/// Platform capability that re-authenticates the user (fingerprint, face, PIN pad).
pub trait BiometricGate: Send + Sync {
    /// Whether the hardware exists and the user is enrolled.
    fn is_available(&self) -> bool;

    /// Show the prompt. `Ok(false)` means the user or the OS cancelled,
    /// which callers treat as a normal fallback to the secret.
    fn prompt_and_confirm(&self, reason: &str) -> Result<bool>;
}

/// Gate for platforms without biometric hardware.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBiometrics;

impl BiometricGate for NoBiometrics {
    fn is_available(&self) -> bool {
        false
    }

    fn prompt_and_confirm(&self, _reason: &str) -> Result<bool> {
        Ok(false)
    }
}

fn encode_key(key: &SessionKey) -> Zeroizing<String> {
    Zeroizing::new(STANDARD.encode(key.as_bytes()))
}

fn decode_key(encoded: &str) -> Result<SessionKey> {
    let bytes = STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(|_| VaultError::EscrowUnavailable("Escrowed key is malformed".to_string()))?;
    Ok(SessionKey::from_bytes(bytes))
}

/// Escrow backed by the OS keychain / credential manager.
#[derive(Debug, Clone)]
pub struct KeyringEscrow {
    account: String,
}

impl KeyringEscrow {
    /// Escrow slot for an explicit account name.
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    /// Escrow slot keyed by the data directory, so separate stores never share a slot.
    pub fn for_data_dir(dir: &Path) -> Self {
        Self::new(format!("session-key-{}", data_dir_hash(dir)))
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(ESCROW_SERVICE, &self.account)
            .map_err(|e| VaultError::EscrowUnavailable(format!("Keychain entry failed: {}", e)))
    }
}

impl KeyEscrow for KeyringEscrow {
    /// Only builds the entry handle; no secret is read, so this never
    /// triggers a keychain access prompt. A store that later refuses the
    /// write surfaces through [`KeyEscrow::store`].
    fn is_available(&self) -> bool {
        self.entry().is_ok()
    }

    fn store(&self, key: &SessionKey) -> Result<()> {
        let encoded = encode_key(key);
        self.entry()?
            .set_password(&encoded)
            .map_err(|e| VaultError::EscrowUnavailable(format!("Keychain write failed: {}", e)))
    }

    fn retrieve(&self) -> Result<Option<SessionKey>> {
        match self.entry()?.get_password() {
            Ok(value) => {
                let value = Zeroizing::new(value);
                decode_key(&value).map(Some)
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(VaultError::EscrowUnavailable(format!(
                "Keychain read failed: {}",
                err
            ))),
        }
    }

    fn remove(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(VaultError::EscrowUnavailable(format!(
                "Keychain delete failed: {}",
                err
            ))),
        }
    }
}

/// In-process escrow for hosts without a credential store.
///
/// Clones share the same slot.
#[derive(Debug, Clone)]
pub struct MemoryEscrow {
    slot: Arc<Mutex<Option<Zeroizing<String>>>>,
    available: bool,
}

impl Default for MemoryEscrow {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEscrow {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            available: true,
        }
    }

    /// An escrow whose store refuses every operation, like a denied permission.
    pub fn unavailable() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            available: false,
        }
    }

    /// Whether a key is currently held.
    pub fn is_occupied(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    fn with_slot<T>(&self, f: impl FnOnce(&mut Option<Zeroizing<String>>) -> T) -> Result<T> {
        if !self.available {
            return Err(VaultError::EscrowUnavailable(
                "No secure storage available".to_string(),
            ));
        }
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| VaultError::EscrowUnavailable("Escrow slot poisoned".to_string()))?;
        Ok(f(&mut slot))
    }
}

impl KeyEscrow for MemoryEscrow {
    fn is_available(&self) -> bool {
        self.available
    }

    fn store(&self, key: &SessionKey) -> Result<()> {
        let encoded = encode_key(key);
        self.with_slot(|slot| *slot = Some(encoded))
    }

    fn retrieve(&self) -> Result<Option<SessionKey>> {
        let encoded = self.with_slot(|slot| slot.clone())?;
        encoded.map(|value| decode_key(&value)).transpose()
    }

    fn remove(&self) -> Result<()> {
        self.with_slot(|slot| *slot = None)
    }
}

fn data_dir_hash(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let hash = blake3::hash(canonical.to_string_lossy().as_bytes());
    hash.to_hex()[..16].to_string()
}
