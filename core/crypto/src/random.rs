//! Thin wrapper over the operating system CSPRNG.
//!
//! Every random byte in this crate comes from here. There is no fallback
//! generator: if the OS source fails the caller gets `Error::Entropy`.

use rand::rngs::OsRng;
use rand::RngCore;

use zkvault_common::{Error, Result};

/// Fill `buf` from the OS random source.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| Error::Entropy(e.to_string()))
}

/// Uniform integer in `0..bound` using rejection sampling.
///
/// A zero bound is rejected with `InvalidInput`.
pub(crate) fn random_below(bound: u32) -> Result<u32> {
    if bound == 0 {
        return Err(Error::InvalidInput("Random bound must be positive".to_string()));
    }

    // Largest multiple of `bound` that fits in u32; values at or above it
    // would skew the distribution toward small results.
    let zone = u32::MAX - (u32::MAX % bound);
    loop {
        let mut bytes = [0u8; 4];
        fill_random(&mut bytes)?;
        let value = u32::from_le_bytes(bytes);
        if value < zone {
            return Ok(value % bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_random_changes_buffer() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        fill_random(&mut a).unwrap();
        fill_random(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_below_stays_in_range() {
        for bound in [1u32, 2, 7, 26, 88] {
            for _ in 0..200 {
                assert!(random_below(bound).unwrap() < bound);
            }
        }
    }

    #[test]
    fn test_random_below_zero_rejected() {
        assert!(random_below(0).is_err());
    }
}
