//! Key derivation using Argon2id.
//!
//! This module derives the session key from a user secret using the Argon2id
//! algorithm, which is memory-hard and resistant to GPU-based attacks. The
//! cost parameters and salt travel with the Settings document, so files
//! written under older parameters stay decryptable after the defaults change.

use argon2::Argon2;
use serde::{Deserialize, Serialize};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::{Result, VaultError};

/// Salt length in bytes.
pub const SALT_LENGTH: usize = 16;

/// Length of the session key in bytes (256 bits for AES-256-GCM).
pub const KEY_LENGTH: usize = 32;

/// Argon2id defaults:
/// - Memory: 64 MB (64 * 1024 KB)
/// - Iterations: 3
/// - Parallelism: 1
const ARGON2_MEMORY_KB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;

/// Key derivation algorithm recorded alongside the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfAlgorithm {
    Argon2id,
}

/// Tunable KDF parameters, persisted unencrypted in Settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParams {
    pub algorithm: KdfAlgorithm,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub key_length: usize,
    /// Generated once when encryption is first enabled; immutable afterwards.
    #[serde(default, with = "crate::encoding::b64_opt")]
    pub salt: Option<Vec<u8>>,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            algorithm: KdfAlgorithm::Argon2id,
            memory_kib: ARGON2_MEMORY_KB,
            iterations: ARGON2_ITERATIONS,
            parallelism: ARGON2_PARALLELISM,
            key_length: KEY_LENGTH,
            salt: None,
        }
    }
}

impl KdfParams {
    /// Same cost parameters with the given salt.
    pub fn with_salt(mut self, salt: Vec<u8>) -> Self {
        self.salt = Some(salt);
        self
    }
}

/// The in-memory session key.
///
/// Key material is zeroized when the value is dropped, so discarding the
/// key on lock overwrites it rather than merely releasing it.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SessionKey {
    key: Vec<u8>,
}

impl SessionKey {
    /// Wrap raw key bytes (e.g. from the escrow).
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate encryption operations.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh random salt.
pub fn generate_salt() -> Result<Vec<u8>> {
    let mut salt = vec![0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt)
        .map_err(|e| VaultError::Crypto(format!("Failed to generate salt: {}", e)))?;
    Ok(salt)
}

/// Derive the session key from a secret and the persisted KDF parameters.
///
/// # Errors
///
/// - `VaultError::MissingSalt` if `params.salt` is absent
/// - `VaultError::InvalidInput` for an empty secret
/// - `VaultError::Crypto` if the parameters are rejected by Argon2
///
/// # Security
///
/// - Same secret + params always produces the same key (deterministic)
/// - Memory-hard: cost is set by `params`, resistant to GPU attacks
pub fn derive_key(secret: &str, params: &KdfParams) -> Result<SessionKey> {
    let salt = params.salt.as_deref().ok_or(VaultError::MissingSalt)?;

    if secret.is_empty() {
        return Err(VaultError::InvalidInput("Secret cannot be empty".to_string()));
    }

    let argon2_params = argon2::Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(params.key_length),
    )
    .map_err(|e| VaultError::Crypto(format!("Failed to create Argon2 params: {}", e)))?;

    let argon2 = match params.algorithm {
        KdfAlgorithm::Argon2id => Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            argon2_params,
        ),
    };

    let mut key_bytes = Zeroizing::new(vec![0u8; params.key_length]);
    argon2
        .hash_password_into(secret.as_bytes(), salt, &mut key_bytes)
        .map_err(|e| VaultError::Crypto(format!("Key derivation failed: {}", e)))?;

    Ok(SessionKey::from_bytes(key_bytes.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_params(salt: &[u8]) -> KdfParams {
        KdfParams {
            memory_kib: 64,
            iterations: 1,
            ..KdfParams::default()
        }
        .with_salt(salt.to_vec())
    }

    #[test]
    fn test_key_derivation_deterministic() {
        let params = cheap_params(b"unique-salt-1234");

        let key1 = derive_key("abcd", &params).unwrap();
        let key2 = derive_key("abcd", &params).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key("abcd", &cheap_params(b"salt1-1234567890")).unwrap();
        let key2 = derive_key("abcd", &cheap_params(b"salt2-1234567890")).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_secret_different_key() {
        let params = cheap_params(b"fixed-salt-12345");

        let key1 = derive_key("secret-one", &params).unwrap();
        let key2 = derive_key("secret-two", &params).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_missing_salt_rejected() {
        let params = KdfParams {
            memory_kib: 64,
            iterations: 1,
            ..KdfParams::default()
        };
        assert!(matches!(
            derive_key("abcd", &params),
            Err(VaultError::MissingSalt)
        ));
    }

    #[test]
    fn test_cost_params_change_key() {
        let salt = b"fixed-salt-12345";
        let cheap = cheap_params(salt);
        let costlier = KdfParams {
            iterations: 2,
            ..cheap.clone()
        };

        let key1 = derive_key("abcd", &cheap).unwrap();
        let key2 = derive_key("abcd", &costlier).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_key_length() {
        let key = derive_key("abcd", &cheap_params(b"salt-12345678901")).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_LENGTH);
    }

    #[test]
    fn test_generated_salts_differ() {
        let salt1 = generate_salt().unwrap();
        let salt2 = generate_salt().unwrap();
        assert_eq!(salt1.len(), SALT_LENGTH);
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn test_params_serialize_salt_as_base64() {
        let params = cheap_params(&[0u8; 16]);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["algorithm"], "argon2id");
        assert_eq!(json["memoryKib"], 64);
        assert_eq!(json["salt"], "AAAAAAAAAAAAAAAAAAAAAA==");

        let back: KdfParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_session_key_debug_redacts() {
        let key = derive_key("abcd", &cheap_params(b"salt-12345678901")).unwrap();

        let debug_output = format!("{:?}", key);
        assert!(debug_output.contains("REDACTED"));

        let key_hex = hex::encode(&key.as_bytes()[..4]);
        assert!(!debug_output.contains(&key_hex));
    }
}
