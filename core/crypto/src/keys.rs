//! Key types with secure memory handling.
//!
//! `MasterKeyMaterial` zeroizes its memory on drop so the derived key does not
//! persist after the owning session ends. It deliberately has no `Serialize`
//! or `Clone` impl; share it between concurrent operations through an `Arc`.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::random::fill_random;
use zkvault_common::{Error, Identity, Result};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of generated and identity-bound salts.
pub const SALT_LENGTH: usize = 32;

/// Shortest salt accepted for derivation.
pub const SALT_MIN_LENGTH: usize = 16;

/// Longest salt accepted for derivation.
pub const SALT_MAX_LENGTH: usize = 64;

const IDENTITY_SALT_DOMAIN: &[u8] = b"zkvault/salt/v1";

/// Symmetric key derived from the user's password, plus the salt that
/// produced it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKeyMaterial {
    key: [u8; KEY_LENGTH],
    salt: Salt,
}

impl MasterKeyMaterial {
    /// Wrap raw key bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH], salt: Salt) -> Self {
        Self { key, salt }
    }

    /// Wrap key bytes of unchecked length.
    ///
    /// # Errors
    /// - `InvalidKey` if `key` is not exactly `KEY_LENGTH` bytes
    pub fn from_slice(key: &[u8], salt: Salt) -> Result<Self> {
        let key: [u8; KEY_LENGTH] = key.try_into().map_err(|_| {
            Error::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LENGTH,
                key.len()
            ))
        })?;
        Ok(Self { key, salt })
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Salt the key was derived with.
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Constant-time comparison of the key bytes.
    pub fn ct_eq(&self, other: &MasterKeyMaterial) -> bool {
        self.key[..].ct_eq(&other.key[..]).into()
    }
}

impl fmt::Debug for MasterKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKeyMaterial([REDACTED])")
    }
}

/// Salt for key derivation.
///
/// Not secret, but length-checked: anything outside
/// `SALT_MIN_LENGTH..=SALT_MAX_LENGTH` is refused.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Generate a random salt.
    ///
    /// # Errors
    /// - `Entropy` if the OS random source is unavailable
    pub fn generate() -> Result<Self> {
        let mut salt = vec![0u8; SALT_LENGTH];
        fill_random(&mut salt)?;
        Ok(Self(salt))
    }

    /// Deterministic salt bound to a user identity.
    ///
    /// BLAKE2b-256 over a fixed domain tag followed by the identity bytes, so
    /// the same user always re-derives the same key and different users never
    /// share a salt.
    pub fn for_identity(identity: &Identity) -> Self {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(IDENTITY_SALT_DOMAIN);
        hasher.update(identity.as_bytes());

        Self(hasher.finalize().to_vec())
    }

    /// Create from bytes.
    ///
    /// # Errors
    /// - `Derivation` if the length is outside the accepted range
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::check_length(bytes.len())?;
        Ok(Self(bytes.to_vec()))
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub(crate) fn validate(&self) -> Result<()> {
        Self::check_length(self.0.len())
    }

    fn check_length(len: usize) -> Result<()> {
        if !(SALT_MIN_LENGTH..=SALT_MAX_LENGTH).contains(&len) {
            return Err(Error::Derivation(format!(
                "salt must be {}..={} bytes, got {}",
                SALT_MIN_LENGTH, SALT_MAX_LENGTH, len
            )));
        }
        Ok(())
    }
}
