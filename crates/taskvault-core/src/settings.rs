//! The process-wide Settings document.
//!
//! Settings are always stored as plaintext JSON: they carry the KDF salt and
//! parameters, which must be readable before any key exists.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;
use crate::error::{Result, VaultError};
use crate::fs::{read_optional, write_atomic};

/// Current settings schema version.
pub const SETTINGS_SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SETTINGS_SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub encryption_enabled: bool,

    /// Never true while encryption is off
    #[serde(default)]
    pub use_biometrics: bool,

    #[serde(default)]
    pub kdf_params: KdfParams,
}

impl Settings {
    /// Defaults for a fresh installation, seeded with the given KDF cost parameters.
    pub fn new(kdf_params: KdfParams) -> Self {
        Self {
            schema_version: SETTINGS_SCHEMA_VERSION,
            encryption_enabled: false,
            use_biometrics: false,
            kdf_params,
        }
    }

    /// Load settings, falling back to `defaults` when the file is absent.
    pub fn load_or(path: &Path, defaults: impl FnOnce() -> Settings) -> Result<Settings> {
        match read_optional(path)? {
            Some(bytes) => {
                let mut settings: Settings = serde_json::from_slice(&bytes).map_err(|e| {
                    VaultError::Storage(format!("Invalid settings file {}: {}", path.display(), e))
                })?;
                if !settings.encryption_enabled {
                    settings.use_biometrics = false;
                }
                Ok(settings)
            }
            None => Ok(defaults()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &bytes)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(KdfParams::default())
    }
}
