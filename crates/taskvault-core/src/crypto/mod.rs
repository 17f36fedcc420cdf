//! Cryptographic operations for TaskVault.
//!
//! This module provides key derivation and authenticated encryption using
//! well-audited libraries:
//! - **Argon2id**: Memory-hard key derivation function
//! - **AES-256-GCM**: Authenticated encryption of whole documents
//!
//! ## Security Model
//!
//! - Secret-based encryption; the derived key lives only in process memory
//! - Sensitive data zeroized from memory on drop
//! - No plaintext secrets stored
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the encrypted data files
//! - Offline brute-force attacks on the secret
//! - Tampering with or truncation of encrypted files
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to an unlocked session / memory

pub mod envelope;
pub mod key;
pub mod passphrase;

pub use envelope::{decrypt, encrypt, AeadAlgorithm, EncryptedEnvelope, StoredDocument};
pub use key::{derive_key, generate_salt, KdfAlgorithm, KdfParams, SessionKey};
pub use passphrase::validate_secret;
