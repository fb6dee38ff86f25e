//! Client configuration.
//!
//! Resolution order: built-in defaults, then an optional JSON file, then
//! environment overrides (`ZKVAULT_API_BASE`, `ZKVAULT_KDF`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use zkvault_common::{Error, Result};
use zkvault_crypto::KdfParams;
use zkvault_store::{HttpStore, RetryConfig};

/// Environment variable overriding [`VaultConfig::api_base`].
pub const ENV_API_BASE: &str = "ZKVAULT_API_BASE";

/// Environment variable selecting a KDF preset (`interactive` or `moderate`).
pub const ENV_KDF: &str = "ZKVAULT_KDF";

/// Default location of the item service.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Settings for talking to the item store and deriving keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Base URL of the item service.
    pub api_base: String,
    /// Argon2id cost parameters.
    pub kdf_params: KdfParams,
    /// Per-request timeout for store calls.
    pub request_timeout_secs: u64,
    /// Retries for transient store failures.
    pub max_retries: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            kdf_params: KdfParams::default(),
            request_timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl VaultConfig {
    /// Load configuration from an optional file and the process environment.
    ///
    /// # Errors
    /// - I/O or parse errors for the file
    /// - Invalid environment values
    /// - KDF parameters below the safety floor
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_json(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_base) = lookup(ENV_API_BASE) {
            self.api_base = api_base;
        }
        if let Some(preset) = lookup(ENV_KDF) {
            self.kdf_params = KdfParams::from_preset(&preset)?;
        }
        Ok(())
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.api_base.is_empty() {
            return Err(Error::InvalidInput("api_base cannot be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        self.kdf_params.validate()
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy for store calls.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries)
    }

    /// Build an HTTP store client for [`VaultConfig::api_base`].
    pub fn connect(&self) -> Result<HttpStore> {
        HttpStore::new(&self.api_base, self.request_timeout(), self.retry_config())
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}
