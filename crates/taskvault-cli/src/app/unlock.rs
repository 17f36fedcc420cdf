//! Unlocking the session before a command runs.

use std::io::IsTerminal;

use secrecy::SecretString;
use tracing::{debug, warn};

use taskvault_core::{DataStore, SessionLock, UnlockMethod, VaultError};

use crate::constants::MAX_SECRET_ATTEMPTS;
use crate::errors::CliError;
use crate::helpers::{env_secret, prompt_secret};

/// Unlock the session if encryption is on.
///
/// Order: biometric escrow (when enabled), `TASKVAULT_SECRET`, then an
/// interactive prompt with retries. Returns `None` when encryption is off.
pub fn unlock_session(
    store: &DataStore,
    session: &mut SessionLock,
    no_input: bool,
) -> anyhow::Result<Option<UnlockMethod>> {
    if session.is_unlocked() {
        return Ok(None);
    }
    let settings = store.settings()?;
    if !settings.encryption_enabled {
        return Ok(None);
    }

    if settings.use_biometrics {
        match session.unlock(store, None) {
            Ok(method) => return Ok(Some(method)),
            Err(VaultError::NeedSecret) => debug!("biometric unlock skipped"),
            Err(VaultError::EscrowKeyMissing) => {
                warn!("no escrowed key; falling back to the secret")
            }
            Err(VaultError::WrongSecret) => {
                warn!("escrowed key rejected; falling back to the secret")
            }
            Err(VaultError::EscrowUnavailable(reason)) => {
                warn!(%reason, "keychain unavailable; falling back to the secret")
            }
            Err(err) => return Err(err.into()),
        }
    }

    if let Some(secret) = env_secret() {
        return session
            .unlock(store, Some(&secret))
            .map(Some)
            .map_err(|e| CliError::from(e).into());
    }

    let interactive = std::io::stdin().is_terminal() && !no_input;
    unlock_with_retry_prompt(store, session, interactive).map(Some)
}

fn unlock_with_retry_prompt(
    store: &DataStore,
    session: &mut SessionLock,
    interactive: bool,
) -> anyhow::Result<UnlockMethod> {
    if !interactive {
        return Err(CliError::from(VaultError::NeedSecret).into());
    }

    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        let secret: SecretString = prompt_secret("Secret")?;
        match session.unlock(store, Some(&secret)) {
            Ok(method) => return Ok(method),
            Err(VaultError::WrongSecret) => {
                let remaining = MAX_SECRET_ATTEMPTS.saturating_sub(attempts);
                if remaining == 0 {
                    return Err(CliError::auth_failed("Too many failed secret attempts.")
                        .with_hint(
                            "If you forgot your secret, the data cannot be recovered.\n      Backups use the same secret.",
                        )
                        .into());
                }
                eprintln!(
                    "Incorrect secret. {} attempt{} remaining.",
                    remaining,
                    if remaining == 1 { "" } else { "s" }
                );
            }
            Err(err) => return Err(CliError::from(err).into()),
        }
    }
}
