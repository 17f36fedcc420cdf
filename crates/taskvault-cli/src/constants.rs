//! Constants used throughout the CLI.

/// Environment variable holding the secret for non-interactive use.
pub const SECRET_ENV: &str = "TASKVAULT_SECRET";

/// Environment variable overriding the data directory.
pub const DIR_ENV: &str = "TASKVAULT_DIR";

/// Environment variable overriding the config file path.
pub const CONFIG_ENV: &str = "TASKVAULT_CONFIG";

/// Data directory used in development mode, relative to the working directory.
pub const DEV_DATA_DIR: &str = ".taskvault-dev";

/// Secret prompts before giving up.
pub const MAX_SECRET_ATTEMPTS: u32 = 3;

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (project, task, backup file).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong secret, too many attempts, locked).
    pub const AUTH_FAILED: i32 = 5;

    /// Integrity check failed.
    pub const INTEGRITY_FAILED: i32 = 6;
}
