//! Console stand-in for a biometric sensor.

use std::io::IsTerminal;

use dialoguer::Confirm;
use tracing::debug;

use taskvault_core::{BiometricGate, Result, VaultError};

/// Asks for a yes/no confirmation on the terminal.
///
/// Only available when stdin is a TTY and prompts are allowed.
pub struct ConsoleGate {
    enabled: bool,
}

impl ConsoleGate {
    pub fn new(enabled: bool, no_input: bool) -> Self {
        Self {
            enabled: enabled && !no_input && std::io::stdin().is_terminal(),
        }
    }
}

impl BiometricGate for ConsoleGate {
    fn is_available(&self) -> bool {
        self.enabled
    }

    fn prompt_and_confirm(&self, reason: &str) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        debug!("showing console confirmation");
        Confirm::new()
            .with_prompt(reason)
            .default(true)
            .interact_opt()
            .map(|answer| answer.unwrap_or(false))
            .map_err(|e| VaultError::EscrowUnavailable(format!("Prompt failed: {}", e)))
    }
}
