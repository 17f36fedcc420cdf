//! Secret validation.
//!
//! Enforces minimum requirements for the secret used to enable encryption.
//! The secret is often a short numeric passcode, so the floor is low; the
//! memory-hard KDF carries the brute-force cost.

use crate::error::{Result, VaultError};

/// Minimum secret length in characters.
const MIN_SECRET_LENGTH: usize = 4;

/// Validate a secret meets minimum requirements.
///
/// # Requirements
///
/// - At least 4 characters long
/// - Not empty or only whitespace
///
/// # Examples
///
/// ```
/// use taskvault_core::crypto::validate_secret;
///
/// assert!(validate_secret("abcd").is_ok());
/// assert!(validate_secret("abc").is_err());
/// ```
pub fn validate_secret(secret: &str) -> Result<()> {
    if secret.trim().is_empty() {
        return Err(VaultError::InvalidInput("Secret cannot be empty".to_string()));
    }

    let length = secret.chars().count();
    if length < MIN_SECRET_LENGTH {
        return Err(VaultError::InvalidInput(format!(
            "Secret must be at least {} characters (got {})",
            MIN_SECRET_LENGTH, length
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_secrets() {
        assert!(validate_secret("abcd").is_ok());
        assert!(validate_secret("1234").is_ok());
        assert!(validate_secret("longer secret with spaces and symbols!@#").is_ok());
    }

    #[test]
    fn test_secret_too_short() {
        let result = validate_secret("abc");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("at least 4 characters"));
    }

    #[test]
    fn test_secret_empty() {
        assert!(validate_secret("").is_err());
        assert!(validate_secret("    ").is_err());
        assert!(validate_secret("\n\t").is_err());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // Three characters, nine bytes.
        assert!(validate_secret("äöü").is_err());
    }
}
