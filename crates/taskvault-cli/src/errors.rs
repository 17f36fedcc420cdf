//! CLI-level errors carrying an exit code and an optional hint.

use std::fmt;

use taskvault_core::VaultError;

use crate::constants::exit_codes;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::new(exit_codes::AUTH_FAILED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(exit_codes::NOT_FOUND, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(exit_codes::INVALID_INPUT, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<VaultError> for CliError {
    fn from(err: VaultError) -> Self {
        let error = Self::new(vault_exit_code(&err), err.to_string());
        match vault_hint(&err) {
            Some(hint) => error.with_hint(hint),
            None => error,
        }
    }
}

fn vault_exit_code(err: &VaultError) -> i32 {
    match err {
        VaultError::WrongSecret
        | VaultError::Authentication
        | VaultError::Locked
        | VaultError::NeedSecret
        | VaultError::EscrowKeyMissing => exit_codes::AUTH_FAILED,
        VaultError::NotFound(_) => exit_codes::NOT_FOUND,
        VaultError::DuplicateName(_)
        | VaultError::Validation(_)
        | VaultError::InvalidInput(_)
        | VaultError::InvalidBackup(_)
        | VaultError::EncryptionDisabled => exit_codes::INVALID_INPUT,
        _ => 1,
    }
}

fn vault_hint(err: &VaultError) -> Option<&'static str> {
    match err {
        VaultError::WrongSecret | VaultError::Authentication => {
            Some("If the secret is lost, restore from a backup you can still unlock.")
        }
        VaultError::Locked | VaultError::NeedSecret => {
            Some("Set TASKVAULT_SECRET or run in a terminal to be prompted.")
        }
        VaultError::EscrowKeyMissing => {
            Some("Unlock once with your secret to restore biometric unlock.")
        }
        _ => None,
    }
}

/// Map any error to the process exit code it should produce.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.code;
    }
    if let Some(vault) = err.downcast_ref::<VaultError>() {
        return vault_exit_code(vault);
    }
    1
}

/// Hint to print after an error, if any.
pub fn hint_for(err: &anyhow::Error) -> Option<String> {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.hint.clone();
    }
    err.downcast_ref::<VaultError>()
        .and_then(vault_hint)
        .map(str::to_string)
}
