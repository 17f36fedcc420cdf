//! Session lock: the in-memory key and the security operations around it.
//!
//! A [`SessionLock`] is either locked (no key) or unlocked (holding the
//! derived [`SessionKey`]). It is passed explicitly to every
//! [`DataStore`] call that touches encrypted data; there is no global key.
//!
//! The key never touches disk except through the [`KeyEscrow`], and only
//! when the user opted into biometric unlock.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::crypto::{decrypt, derive_key, generate_salt, validate_secret, SessionKey, StoredDocument};
use crate::error::{Result, VaultError};
use crate::escrow::{BiometricGate, KeyEscrow};
use crate::settings::Settings;
use crate::storage::{DataStore, Dataset, DatasetKind};

const BIOMETRIC_REASON: &str = "Unlock your tasks";

/// Snapshot of the security state for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfig {
    pub encryption_enabled: bool,
    pub use_biometrics: bool,
    pub biometrics_available: bool,
}

/// How a successful unlock obtained the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockMethod {
    Secret,
    Biometrics,
}

/// Result of [`SessionLock::enable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableOutcome {
    /// Encryption is now on; `biometrics` says whether the key was escrowed.
    Enabled { biometrics: bool },
    /// Encryption was already on; nothing changed.
    AlreadyEnabled,
}

pub struct SessionLock {
    key: Option<SessionKey>,
    escrow: Box<dyn KeyEscrow>,
    biometrics: Box<dyn BiometricGate>,
}

impl std::fmt::Debug for SessionLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLock")
            .field("unlocked", &self.key.is_some())
            .finish()
    }
}

impl SessionLock {
    /// A locked session using the given escrow and biometric gate.
    pub fn new(escrow: impl KeyEscrow + 'static, biometrics: impl BiometricGate + 'static) -> Self {
        Self {
            key: None,
            escrow: Box::new(escrow),
            biometrics: Box::new(biometrics),
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    /// The session key, if unlocked.
    pub fn key(&self) -> Option<&SessionKey> {
        self.key.as_ref()
    }

    /// Both the biometric prompt and the escrow are usable on this machine.
    pub fn biometrics_available(&self) -> bool {
        self.biometrics.is_available() && self.escrow.is_available()
    }

    pub fn security_config(&self, store: &DataStore) -> Result<SecurityConfig> {
        let settings = store.settings()?;
        Ok(SecurityConfig {
            encryption_enabled: settings.encryption_enabled,
            use_biometrics: settings.use_biometrics,
            biometrics_available: self.biometrics_available(),
        })
    }

    /// Turn encryption on and re-encrypt every existing dataset.
    ///
    /// A salt is generated on first use and kept for the life of the
    /// installation. Settings are written before the datasets, so an
    /// interruption leaves plaintext datasets that [`unlock`](Self::unlock)
    /// encrypts later. Leaves the session unlocked.
    ///
    /// Biometric escrow is best-effort: if it fails, encryption still
    /// succeeds with `biometrics: false`.
    pub fn enable(
        &mut self,
        store: &DataStore,
        secret: &SecretString,
        use_biometrics: bool,
    ) -> Result<EnableOutcome> {
        let mut settings = store.settings()?;
        if settings.encryption_enabled {
            info!("encryption already enabled");
            return Ok(EnableOutcome::AlreadyEnabled);
        }
        validate_secret(secret.expose_secret())?;

        if settings.kdf_params.salt.is_none() {
            settings.kdf_params = store
                .config()
                .kdf_defaults
                .clone()
                .with_salt(generate_salt()?);
        }
        let key = derive_key(secret.expose_secret(), &settings.kdf_params)?;

        let active = store
            .read_dataset(DatasetKind::Active, None)?
            .unwrap_or_else(|| Dataset::new_active(Utc::now()));
        let archive = store.read_dataset(DatasetKind::Archive, None)?;

        settings.encryption_enabled = true;
        settings.use_biometrics = false;
        store.save_settings(&settings)?;

        store.write_dataset(DatasetKind::Active, &active, Some(&key))?;
        if let Some(archive) = archive {
            store.write_dataset(DatasetKind::Archive, &archive, Some(&key))?;
        }
        self.key = Some(key);
        info!("encryption enabled");

        let biometrics = use_biometrics && {
            if self.biometrics.is_available() {
                self.escrow_key(store, &mut settings)
            } else {
                warn!("biometric unlock unavailable; continuing without it");
                false
            }
        };
        Ok(EnableOutcome::Enabled { biometrics })
    }

    /// Unlock with a secret, or with the escrowed key when `secret` is `None`.
    ///
    /// The candidate key is checked against the Active dataset before it is
    /// accepted. Datasets still stored as plaintext are encrypted on success.
    ///
    /// # Errors
    ///
    /// - `EncryptionDisabled` when there is nothing to unlock
    /// - `NeedSecret` when no secret was given and biometrics are off,
    ///   unavailable, or the prompt was cancelled
    /// - `EscrowKeyMissing` when biometrics passed but no key is escrowed
    /// - `WrongSecret` when the key does not decrypt the Active dataset;
    ///   a rejected escrowed key is also removed from escrow
    pub fn unlock(&mut self, store: &DataStore, secret: Option<&SecretString>) -> Result<UnlockMethod> {
        let mut settings = store.settings()?;
        if !settings.encryption_enabled {
            return Err(VaultError::EncryptionDisabled);
        }

        let (candidate, method) = match secret {
            Some(secret) => (
                derive_key(secret.expose_secret(), &settings.kdf_params)?,
                UnlockMethod::Secret,
            ),
            None => (self.key_from_escrow(&settings)?, UnlockMethod::Biometrics),
        };

        match verify_key(store, &candidate) {
            Ok(()) => {}
            Err(VaultError::Authentication) => {
                if method == UnlockMethod::Biometrics {
                    warn!("escrowed key rejected; removing it");
                    if let Err(err) = self.escrow.remove() {
                        warn!(error = %err, "failed to remove stale escrowed key");
                    }
                }
                return Err(VaultError::WrongSecret);
            }
            Err(err) => return Err(err),
        }

        store.migrate_plaintext(&candidate)?;
        self.key = Some(candidate);
        info!(method = ?method, "session unlocked");

        if method == UnlockMethod::Secret && settings.use_biometrics {
            self.escrow_key(store, &mut settings);
        }
        Ok(method)
    }

    /// Drop the key. Always succeeds.
    pub fn lock(&mut self) {
        if self.key.take().is_some() {
            info!("session locked");
        }
    }

    /// Turn encryption off, rewriting every dataset as plaintext.
    ///
    /// Datasets are written before settings. The salt is kept so a later
    /// enable reuses it. Leaves the session locked.
    pub fn disable(&mut self, store: &DataStore) -> Result<()> {
        let mut settings = store.settings()?;
        if !settings.encryption_enabled {
            return Err(VaultError::EncryptionDisabled);
        }
        let key = self.key.as_ref().ok_or(VaultError::Locked)?;

        store.reencode_all(Some(key), None)?;

        settings.encryption_enabled = false;
        settings.use_biometrics = false;
        store.save_settings(&settings)?;

        self.discard_escrow();
        self.lock();
        info!("encryption disabled");
        Ok(())
    }

    /// Opt in or out of biometric unlock. Requires an unlocked session.
    ///
    /// Returns the resulting flag.
    pub fn set_use_biometrics(&mut self, store: &DataStore, enabled: bool) -> Result<bool> {
        let mut settings = store.settings()?;
        if !settings.encryption_enabled {
            return Err(VaultError::EncryptionDisabled);
        }
        if self.key.is_none() {
            return Err(VaultError::Locked);
        }

        if !enabled {
            self.discard_escrow();
            settings.use_biometrics = false;
            store.save_settings(&settings)?;
            return Ok(false);
        }

        if !self.biometrics_available() {
            return Err(VaultError::EscrowUnavailable(
                "Biometric unlock is not available on this device".to_string(),
            ));
        }
        if self.escrow_key(store, &mut settings) {
            Ok(true)
        } else {
            Err(VaultError::EscrowUnavailable(
                "Could not store the key in secure storage".to_string(),
            ))
        }
    }

    /// Remove all data, clear escrow, lock, and write fresh defaults.
    pub fn reset_environment(&mut self, store: &DataStore) -> Result<()> {
        self.invalidate();
        store.reset()
    }

    /// Lock and drop the escrowed key, for when on-disk key material changes underneath us.
    pub(crate) fn invalidate(&mut self) {
        self.lock();
        self.discard_escrow();
    }

    /// Retrieve the escrowed key behind the biometric prompt.
    fn key_from_escrow(&self, settings: &Settings) -> Result<SessionKey> {
        if !settings.use_biometrics || !self.biometrics_available() {
            return Err(VaultError::NeedSecret);
        }
        match self.biometrics.prompt_and_confirm(BIOMETRIC_REASON) {
            Ok(true) => {}
            Ok(false) => {
                debug!("biometric prompt cancelled");
                return Err(VaultError::NeedSecret);
            }
            Err(err) => {
                warn!(error = %err, "biometric prompt failed");
                return Err(VaultError::NeedSecret);
            }
        }
        self.escrow.retrieve()?.ok_or(VaultError::EscrowKeyMissing)
    }

    /// Escrow the current key and record the outcome in settings.
    ///
    /// Only the escrow store decides the outcome; whether the prompt can be
    /// shown right now does not. Failures are logged and leave biometrics off. Returns whether the key
    /// is now escrowed.
    fn escrow_key(&self, store: &DataStore, settings: &mut Settings) -> bool {
        let stored = match &self.key {
            Some(key) if self.escrow.is_available() => match self.escrow.store(key) {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "failed to escrow session key");
                    false
                }
            },
            Some(_) => {
                warn!("secure storage unavailable; continuing without biometric unlock");
                false
            }
            None => false,
        };

        if settings.use_biometrics != stored {
            settings.use_biometrics = stored;
            if let Err(err) = store.save_settings(settings) {
                warn!(error = %err, "failed to record biometric preference");
                return false;
            }
        }
        stored
    }

    fn discard_escrow(&self) {
        if let Err(err) = self.escrow.remove() {
            warn!(error = %err, "failed to remove escrowed key");
        }
    }
}

/// Check a candidate key against the first encrypted dataset, Active then Archive.
///
/// With no envelope on disk there is nothing to check against.
fn verify_key(store: &DataStore, key: &SessionKey) -> Result<()> {
    for kind in [DatasetKind::Active, DatasetKind::Archive] {
        if let Some(StoredDocument::Encrypted(envelope)) = store.read_document(kind)? {
            return decrypt(&envelope, key).map(|_| ());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::crypto::KdfParams;
    use crate::escrow::{MemoryEscrow, NoBiometrics};
    use tempfile::tempdir;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn open(dir: &std::path::Path) -> DataStore {
        let params = KdfParams {
            memory_kib: 64,
            iterations: 1,
            ..KdfParams::default()
        };
        DataStore::open(StoreConfig::in_dir(dir).with_kdf_defaults(params)).unwrap()
    }

    #[test]
    fn test_unlock_without_encryption() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let mut session = SessionLock::new(MemoryEscrow::new(), NoBiometrics);

        assert!(matches!(
            session.unlock(&store, Some(&secret("1234"))),
            Err(VaultError::EncryptionDisabled)
        ));
    }

    #[test]
    fn test_enable_twice_is_noop() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let mut session = SessionLock::new(MemoryEscrow::new(), NoBiometrics);

        let first = session.enable(&store, &secret("1234"), false).unwrap();
        assert_eq!(first, EnableOutcome::Enabled { biometrics: false });
        let salt = store.settings().unwrap().kdf_params.salt;

        let second = session.enable(&store, &secret("other"), false).unwrap();
        assert_eq!(second, EnableOutcome::AlreadyEnabled);
        assert_eq!(store.settings().unwrap().kdf_params.salt, salt);
    }

    #[test]
    fn test_enable_rejects_short_secret() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let mut session = SessionLock::new(MemoryEscrow::new(), NoBiometrics);

        assert!(matches!(
            session.enable(&store, &secret("12"), false),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(!store.settings().unwrap().encryption_enabled);
    }

    #[test]
    fn test_biometrics_requested_without_hardware() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let escrow = MemoryEscrow::new();
        let mut session = SessionLock::new(escrow.clone(), NoBiometrics);

        let outcome = session.enable(&store, &secret("1234"), true).unwrap();

        assert_eq!(outcome, EnableOutcome::Enabled { biometrics: false });
        assert!(!escrow.is_occupied());
        assert!(!store.settings().unwrap().use_biometrics);
    }

    struct ConfirmingGate;

    impl BiometricGate for ConfirmingGate {
        fn is_available(&self) -> bool {
            true
        }

        fn prompt_and_confirm(&self, _reason: &str) -> Result<bool> {
            Ok(true)
        }
    }

    /// Reports itself usable but rejects every write, like a locked keychain.
    struct RefusingEscrow;

    impl KeyEscrow for RefusingEscrow {
        fn is_available(&self) -> bool {
            true
        }

        fn store(&self, _key: &SessionKey) -> Result<()> {
            Err(VaultError::EscrowUnavailable("keychain is locked".to_string()))
        }

        fn retrieve(&self) -> Result<Option<SessionKey>> {
            Ok(None)
        }

        fn remove(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_escrow_write_failure_turns_biometrics_off() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let mut session = SessionLock::new(RefusingEscrow, ConfirmingGate);

        let outcome = session.enable(&store, &secret("1234"), true).unwrap();

        assert_eq!(outcome, EnableOutcome::Enabled { biometrics: false });
        assert!(session.is_unlocked());
        let settings = store.settings().unwrap();
        assert!(settings.encryption_enabled);
        assert!(!settings.use_biometrics);
    }

    #[test]
    fn test_disable_requires_unlock() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let mut session = SessionLock::new(MemoryEscrow::new(), NoBiometrics);
        session.enable(&store, &secret("1234"), false).unwrap();
        session.lock();

        assert!(matches!(session.disable(&store), Err(VaultError::Locked)));
    }

    #[test]
    fn test_enable_on_fresh_store_writes_active_envelope() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let mut session = SessionLock::new(MemoryEscrow::new(), NoBiometrics);

        session.enable(&store, &secret("abcd"), false).unwrap();

        assert!(matches!(
            store.read_document(DatasetKind::Active).unwrap(),
            Some(StoredDocument::Encrypted(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected_right_after_enable() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let mut session = SessionLock::new(MemoryEscrow::new(), NoBiometrics);
        session.enable(&store, &secret("abcd"), false).unwrap();
        session.lock();

        assert!(matches!(
            session.unlock(&store, Some(&secret("zzzz"))),
            Err(VaultError::WrongSecret)
        ));
        assert!(!session.is_unlocked());
        assert_eq!(
            session.unlock(&store, Some(&secret("abcd"))).unwrap(),
            UnlockMethod::Secret
        );
    }

    #[test]
    fn test_key_checked_against_archive_when_active_is_plain() {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let mut session = SessionLock::new(MemoryEscrow::new(), NoBiometrics);
        session.enable(&store, &secret("abcd"), false).unwrap();
        let key = SessionKey::from_bytes(session.key().unwrap().as_bytes().to_vec());
        store
            .write_dataset(DatasetKind::Archive, &Dataset::empty_archive(Utc::now()), Some(&key))
            .unwrap();
        store
            .write_dataset(DatasetKind::Active, &Dataset::new_active(Utc::now()), None)
            .unwrap();
        session.lock();

        assert!(matches!(
            session.unlock(&store, Some(&secret("zzzz"))),
            Err(VaultError::WrongSecret)
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let session = SessionLock::new(MemoryEscrow::new(), NoBiometrics);
        assert_eq!(format!("{:?}", session), "SessionLock { unlocked: false }");
    }
}
