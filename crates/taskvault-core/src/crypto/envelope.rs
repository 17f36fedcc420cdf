//! Authenticated encryption of whole documents.
//!
//! Uses AES-256-GCM with a fresh random 96-bit nonce per call and a detached
//! 128-bit tag. The result is a self-describing [`EncryptedEnvelope`] that is
//! stored as a JSON object in place of the plaintext document:
//!
//! ```json
//! { "encrypted": true, "algorithm": "aes-256-gcm",
//!   "nonce": "<b64>", "authTag": "<b64>", "ciphertext": "<b64>" }
//! ```
//!
//! No padding or compression is applied, so ciphertext length reveals
//! plaintext length.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::key::{SessionKey, KEY_LENGTH};
use crate::error::{Result, VaultError};

pub const NONCE_LENGTH: usize = 12;
pub const TAG_LENGTH: usize = 16;

/// AEAD algorithm recorded in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AeadAlgorithm {
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

/// Encrypted file contents. A file holds either plain JSON or exactly one envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    /// Marker distinguishing an envelope from a plaintext document. Always `true`.
    pub encrypted: bool,
    pub algorithm: AeadAlgorithm,
    #[serde(with = "crate::encoding::b64")]
    pub nonce: Vec<u8>,
    #[serde(with = "crate::encoding::b64")]
    pub auth_tag: Vec<u8>,
    #[serde(with = "crate::encoding::b64")]
    pub ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    /// Whether a parsed JSON document carries the envelope marker.
    pub fn is_envelope(value: &serde_json::Value) -> bool {
        value.get("encrypted") == Some(&serde_json::Value::Bool(true))
    }
}

/// A file's parsed contents, classified by shape.
#[derive(Debug, Clone)]
pub enum StoredDocument {
    Plain(serde_json::Value),
    Encrypted(EncryptedEnvelope),
}

impl StoredDocument {
    /// Parse raw file bytes and classify them.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if EncryptedEnvelope::is_envelope(&value) {
            let envelope = serde_json::from_value(value)
                .map_err(|e| VaultError::Storage(format!("Malformed envelope: {}", e)))?;
            Ok(StoredDocument::Encrypted(envelope))
        } else {
            Ok(StoredDocument::Plain(value))
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, StoredDocument::Encrypted(_))
    }
}

fn cipher_for(key: &SessionKey) -> Result<Aes256Gcm> {
    if key.as_bytes().len() != KEY_LENGTH {
        return Err(VaultError::Crypto(format!(
            "Session key must be {} bytes",
            KEY_LENGTH
        )));
    }
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| VaultError::Crypto("Invalid session key".to_string()))
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// # Examples
///
/// ```
/// use taskvault_core::crypto::{decrypt, encrypt, SessionKey};
///
/// let key = SessionKey::from_bytes(vec![7u8; 32]);
/// let envelope = encrypt(b"secret data", &key).unwrap();
/// let decrypted = decrypt(&envelope, &key).unwrap();
/// assert_eq!(decrypted.as_slice(), b"secret data");
/// ```
pub fn encrypt(plaintext: &[u8], key: &SessionKey) -> Result<EncryptedEnvelope> {
    let cipher = cipher_for(key)?;

    let mut nonce = [0u8; NONCE_LENGTH];
    getrandom::getrandom(&mut nonce)
        .map_err(|e| VaultError::Crypto(format!("Failed to generate nonce: {}", e)))?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
        .map_err(|_| VaultError::Crypto("Encryption failed".to_string()))?;

    Ok(EncryptedEnvelope {
        encrypted: true,
        algorithm: AeadAlgorithm::Aes256Gcm,
        nonce: nonce.to_vec(),
        auth_tag: tag.to_vec(),
        ciphertext: buffer,
    })
}

/// Decrypt an envelope.
///
/// # Errors
///
/// Returns `VaultError::Authentication` if the tag does not verify, whatever
/// the cause (wrong key, tampering, truncation). No partial plaintext is
/// ever returned.
pub fn decrypt(envelope: &EncryptedEnvelope, key: &SessionKey) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = cipher_for(key)?;

    if envelope.nonce.len() != NONCE_LENGTH || envelope.auth_tag.len() != TAG_LENGTH {
        return Err(VaultError::Authentication);
    }

    let mut buffer = Zeroizing::new(envelope.ciphertext.clone());
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&envelope.nonce),
            b"",
            &mut buffer,
            Tag::from_slice(&envelope.auth_tag),
        )
        .map_err(|_| VaultError::Authentication)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SessionKey {
        SessionKey::from_bytes(vec![byte; KEY_LENGTH])
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let plaintext = b"Hello, World! This is secret data.";

        let envelope = encrypt(plaintext, &key(1)).unwrap();
        let decrypted = decrypt(&envelope, &key(1)).unwrap();

        assert_eq!(decrypted.as_slice(), plaintext);
    }

    #[test]
    fn test_ciphertext_differs_from_plaintext() {
        let plaintext = b"secret data";
        let envelope = encrypt(plaintext, &key(1)).unwrap();

        assert_ne!(envelope.ciphertext.as_slice(), plaintext);
        assert_eq!(envelope.ciphertext.len(), plaintext.len());
        assert_eq!(envelope.nonce.len(), NONCE_LENGTH);
        assert_eq!(envelope.auth_tag.len(), TAG_LENGTH);
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let first = encrypt(b"same plaintext", &key(1)).unwrap();
        let second = encrypt(b"same plaintext", &key(1)).unwrap();

        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let envelope = encrypt(b"secret data", &key(1)).unwrap();
        assert!(matches!(
            decrypt(&envelope, &key(2)),
            Err(VaultError::Authentication)
        ));
    }

    #[test]
    fn test_flipped_ciphertext_bits_fail() {
        let envelope = encrypt(b"a reasonably long plaintext payload", &key(1)).unwrap();

        for index in 0..envelope.ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered.ciphertext[index] ^= 1 << bit;
                assert!(matches!(
                    decrypt(&tampered, &key(1)),
                    Err(VaultError::Authentication)
                ));
            }
        }
    }

    #[test]
    fn test_flipped_tag_bits_fail() {
        let envelope = encrypt(b"secret data", &key(1)).unwrap();

        for index in 0..TAG_LENGTH {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered.auth_tag[index] ^= 1 << bit;
                assert!(matches!(
                    decrypt(&tampered, &key(1)),
                    Err(VaultError::Authentication)
                ));
            }
        }
    }

    #[test]
    fn test_truncated_tag_fails_authentication() {
        let mut envelope = encrypt(b"secret data", &key(1)).unwrap();
        envelope.auth_tag.truncate(8);
        assert!(matches!(
            decrypt(&envelope, &key(1)),
            Err(VaultError::Authentication)
        ));
    }

    #[test]
    fn test_empty_data_encryption() {
        let envelope = encrypt(b"", &key(3)).unwrap();
        let decrypted = decrypt(&envelope, &key(3)).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_short_key_rejected() {
        let short = SessionKey::from_bytes(vec![1u8; 16]);
        assert!(matches!(encrypt(b"x", &short), Err(VaultError::Crypto(_))));
    }

    #[test]
    fn test_envelope_json_shape() {
        let envelope = encrypt(b"{}", &key(1)).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["encrypted"], true);
        assert_eq!(json["algorithm"], "aes-256-gcm");
        assert!(json["authTag"].is_string());
        assert!(EncryptedEnvelope::is_envelope(&json));

        let doc = StoredDocument::from_value(json).unwrap();
        assert!(doc.is_encrypted());
    }

    #[test]
    fn test_plain_document_classified() {
        let doc = StoredDocument::parse(br#"{"schemaVersion":1,"projects":[]}"#).unwrap();
        assert!(!doc.is_encrypted());

        let doc = StoredDocument::parse(br#"{"encrypted":false}"#).unwrap();
        assert!(!doc.is_encrypted());
    }
}
