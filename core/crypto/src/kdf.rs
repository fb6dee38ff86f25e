//! Key derivation using Argon2id.
//!
//! Argon2id is a memory-hard password hashing function that provides
//! resistance to both GPU brute-force and side-channel attacks. There is no
//! fallback: if Argon2id cannot run, derivation fails.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::keys::{MasterKeyMaterial, Salt, KEY_LENGTH};
use zkvault_common::{Error, Identity, Result};

/// Lowest accepted memory cost in KiB (19 MiB).
pub const MIN_MEMORY_COST: u32 = 19 * 1024;

/// Lowest accepted number of passes.
pub const MIN_TIME_COST: u32 = 2;

/// Highest accepted degree of parallelism.
pub const MAX_PARALLELISM: u32 = 16;

/// Parameters for Argon2id key derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (e.g., 65536 = 64 MiB).
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl KdfParams {
    /// Parameters suitable for interactive, client-side use.
    ///
    /// Same cost point as libsodium's `OPSLIMIT_INTERACTIVE` /
    /// `MEMLIMIT_INTERACTIVE`.
    pub fn interactive() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }

    /// Hardened parameters for infrequent derivations such as once per login.
    ///
    /// Same cost point as libsodium's `OPSLIMIT_MODERATE` /
    /// `MEMLIMIT_MODERATE`.
    pub fn moderate() -> Self {
        Self {
            memory_cost: 262144, // 256 MiB
            time_cost: 3,
            parallelism: 1,
        }
    }

    /// The cheapest parameters that still pass [`KdfParams::validate`].
    pub fn minimum() -> Self {
        Self {
            memory_cost: MIN_MEMORY_COST,
            time_cost: MIN_TIME_COST,
            parallelism: 1,
        }
    }

    /// Parse a preset name as used in configuration files and the CLI.
    pub fn from_preset(name: &str) -> Result<Self> {
        match name {
            "interactive" => Ok(Self::interactive()),
            "moderate" => Ok(Self::moderate()),
            other => Err(Error::InvalidInput(format!(
                "Unknown KDF preset '{}': use interactive or moderate",
                other
            ))),
        }
    }

    /// Check the parameters against the safety floor.
    ///
    /// # Errors
    /// - `Derivation` if any cost is below the floor or parallelism is out of range
    pub fn validate(&self) -> Result<()> {
        if self.time_cost < MIN_TIME_COST {
            return Err(Error::Derivation(format!(
                "time cost {} below minimum {}",
                self.time_cost, MIN_TIME_COST
            )));
        }
        if self.memory_cost < MIN_MEMORY_COST {
            return Err(Error::Derivation(format!(
                "memory cost {} KiB below minimum {} KiB",
                self.memory_cost, MIN_MEMORY_COST
            )));
        }
        if self.parallelism == 0 || self.parallelism > MAX_PARALLELISM {
            return Err(Error::Derivation(format!(
                "parallelism must be 1..={}, got {}",
                MAX_PARALLELISM, self.parallelism
            )));
        }
        if self.memory_cost < 8 * self.parallelism {
            return Err(Error::Derivation(
                "memory cost must be at least 8 KiB per lane".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Derive a master key from a password and salt using Argon2id.
///
/// # Preconditions
/// - `password` must not be empty
/// - `salt` must be 16..=64 bytes
/// - `params` must pass [`KdfParams::validate`]
///
/// # Postconditions
/// - Returns a 32-byte key; same inputs always give the same key
///
/// # Errors
/// - `Derivation` for any rejected input or primitive failure
///
/// # Security
/// - The password is neither stored nor logged. Wiping it is the caller's job.
pub fn derive_key(password: &[u8], salt: &Salt, params: &KdfParams) -> Result<MasterKeyMaterial> {
    if password.is_empty() {
        return Err(Error::Derivation("Password cannot be empty".to_string()));
    }
    salt.validate()?;
    params.validate()?;

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_LENGTH),
    )
    .map_err(|e| Error::Derivation(format!("Invalid KDF parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    debug!(
        memory_cost = params.memory_cost,
        time_cost = params.time_cost,
        parallelism = params.parallelism,
        "Deriving master key"
    );

    let mut key_bytes = Zeroizing::new([0u8; KEY_LENGTH]);
    argon2
        .hash_password_into(password, salt.as_bytes(), &mut key_bytes[..])
        .map_err(|e| Error::Derivation(format!("Key derivation failed: {}", e)))?;

    Ok(MasterKeyMaterial::from_bytes(*key_bytes, salt.clone()))
}

/// Derive a master key using the salt bound to `identity`.
pub fn derive_for_identity(
    identity: &Identity,
    password: &[u8],
    params: &KdfParams,
) -> Result<MasterKeyMaterial> {
    derive_key(password, &Salt::for_identity(identity), params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_salt(byte: u8) -> Salt {
        Salt::from_slice(&[byte; 16]).unwrap()
    }

    #[test]
    fn test_derive_key_deterministic() {
        let password = b"test-password-123";
        let salt = fixed_salt(42);
        let params = KdfParams::minimum();

        let key1 = derive_key(password, &salt, &params).unwrap();
        let key2 = derive_key(password, &salt, &params).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
        assert_eq!(key1.salt(), &salt);
    }

    #[test]
    fn test_derive_key_different_salt() {
        let password = b"test-password-123";
        let params = KdfParams::minimum();

        let key1 = derive_key(password, &fixed_salt(1), &params).unwrap();
        let key2 = derive_key(password, &fixed_salt(2), &params).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_password() {
        let salt = fixed_salt(42);
        let params = KdfParams::minimum();

        let key1 = derive_key(b"password1", &salt, &params).unwrap();
        let key2 = derive_key(b"password2", &salt, &params).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_empty_password_fails() {
        let err = derive_key(b"", &fixed_salt(1), &KdfParams::minimum()).unwrap_err();
        assert!(matches!(err, Error::Derivation(_)));
    }

    #[test]
    fn test_derive_key_weak_params_rejected() {
        let salt = fixed_salt(1);

        let weak_memory = KdfParams {
            memory_cost: 4096,
            ..KdfParams::minimum()
        };
        let weak_time = KdfParams {
            time_cost: 1,
            ..KdfParams::minimum()
        };
        let no_lanes = KdfParams {
            parallelism: 0,
            ..KdfParams::minimum()
        };

        for params in [weak_memory, weak_time, no_lanes] {
            let err = derive_key(b"pw", &salt, &params).unwrap_err();
            assert!(matches!(err, Error::Derivation(_)), "{:?}", params);
        }
    }

    #[test]
    fn test_presets_pass_floor() {
        assert!(KdfParams::interactive().validate().is_ok());
        assert!(KdfParams::moderate().validate().is_ok());
        assert!(KdfParams::minimum().validate().is_ok());
        assert_eq!(KdfParams::default(), KdfParams::interactive());
    }

    #[test]
    fn test_from_preset() {
        assert_eq!(KdfParams::from_preset("moderate").unwrap(), KdfParams::moderate());
        assert_eq!(
            KdfParams::from_preset("interactive").unwrap(),
            KdfParams::interactive()
        );
        assert!(KdfParams::from_preset("sensitive").is_err());
    }

    #[test]
    fn test_derive_for_identity_matches_explicit_salt() {
        let identity = Identity::new("neelan").unwrap();
        let params = KdfParams::minimum();

        let via_identity = derive_for_identity(&identity, b"pw", &params).unwrap();
        let explicit = derive_key(b"pw", &Salt::for_identity(&identity), &params).unwrap();

        assert!(via_identity.ct_eq(&explicit));
    }
}
