//! Input and parsing helpers for the CLI.

use dialoguer::{Confirm, Password};
use secrecy::SecretString;

use taskvault_core::IsoDate;

use crate::constants::SECRET_ENV;
use crate::errors::CliError;

/// The secret from `TASKVAULT_SECRET`, if set and non-blank.
pub fn env_secret() -> Option<SecretString> {
    std::env::var(SECRET_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(SecretString::from)
}

/// Prompt for the secret once.
pub fn prompt_secret(prompt: &str) -> anyhow::Result<SecretString> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map(SecretString::from)
        .map_err(|e| anyhow::anyhow!("Failed to read secret: {}", e))
}

/// Secret for `enable`: the env var, else a prompt with confirmation.
pub fn prompt_new_secret(interactive: bool) -> anyhow::Result<SecretString> {
    if let Some(secret) = env_secret() {
        return Ok(secret);
    }
    if !interactive {
        return Err(CliError::invalid_input("No secret provided and no TTY available.")
            .with_hint(format!("Set {} or run in a terminal.", SECRET_ENV))
            .into());
    }
    Password::new()
        .with_prompt("New secret")
        .with_confirmation("Confirm secret", "Secrets do not match")
        .interact()
        .map(SecretString::from)
        .map_err(|e| anyhow::anyhow!("Failed to read secret: {}", e))
}

/// Ask a yes/no question. `assume_yes` skips the prompt; a missing TTY refuses.
pub fn confirm(prompt: &str, assume_yes: bool, interactive: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !interactive {
        return Err(CliError::invalid_input("Confirmation required but prompts are disabled.")
            .with_hint("Pass --yes to proceed without a prompt.")
            .into());
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Parse a `YYYY-MM-DD` due date.
pub fn parse_due(value: &str) -> anyhow::Result<IsoDate> {
    value
        .parse::<IsoDate>()
        .map_err(|e| CliError::invalid_input(e.to_string()).into())
}
