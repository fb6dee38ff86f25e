//! Random password generation.
//!
//! Draws every character from the OS random source with unbiased range
//! sampling. There is no non-cryptographic fallback.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::random::random_below;
use zkvault_common::{Error, Result};

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+[]{};:,.<>?";

/// Shortest password produced; shorter requests are raised to this.
pub const MIN_LENGTH: usize = 4;

/// Longest password produced; longer requests are capped to this.
pub const MAX_LENGTH: usize = 64;

/// Character classes and length for [`generate_password`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorOptions {
    pub length: usize,
    pub lower: bool,
    pub upper: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: 16,
            lower: true,
            upper: true,
            digits: true,
            symbols: false,
        }
    }
}

impl GeneratorOptions {
    fn pools(&self) -> Vec<&'static [u8]> {
        [
            (self.lower, LOWER),
            (self.upper, UPPER),
            (self.digits, DIGITS),
            (self.symbols, SYMBOLS),
        ]
        .into_iter()
        .filter_map(|(enabled, pool)| enabled.then_some(pool))
        .collect()
    }
}

/// Generate a password.
///
/// The result holds at least one character from every selected class; the
/// rest is drawn from their union and the whole string is shuffled.
///
/// # Errors
/// - `InvalidInput` if no character class is selected
/// - `Entropy` if the OS random source fails
pub fn generate_password(options: &GeneratorOptions) -> Result<Zeroizing<String>> {
    let pools = options.pools();
    if pools.is_empty() {
        return Err(Error::InvalidInput(
            "Pick at least one character type".to_string(),
        ));
    }

    let length = options.length.clamp(MIN_LENGTH, MAX_LENGTH);
    let all: Vec<u8> = pools.concat();

    let mut chars = Zeroizing::new(Vec::with_capacity(length));
    for pool in &pools {
        chars.push(pick(pool)?);
    }
    while chars.len() < length {
        chars.push(pick(&all)?);
    }

    // Fisher-Yates
    for i in (1..chars.len()).rev() {
        let j = random_below(i as u32 + 1)? as usize;
        chars.swap(i, j);
    }

    let password: String = chars.iter().map(|&b| b as char).collect();
    Ok(Zeroizing::new(password))
}

fn pick(pool: &[u8]) -> Result<u8> {
    Ok(pool[random_below(pool.len() as u32)? as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_in(password: &str, pool: &[u8]) -> usize {
        password.bytes().filter(|b| pool.contains(b)).count()
    }

    #[test]
    fn test_default_options() {
        let password = generate_password(&GeneratorOptions::default()).unwrap();

        assert_eq!(password.len(), 16);
        assert!(count_in(&password, LOWER) >= 1);
        assert!(count_in(&password, UPPER) >= 1);
        assert!(count_in(&password, DIGITS) >= 1);
        assert_eq!(count_in(&password, SYMBOLS), 0);
    }

    #[test]
    fn test_every_selected_class_present() {
        let options = GeneratorOptions {
            length: 4,
            symbols: true,
            ..GeneratorOptions::default()
        };

        for _ in 0..50 {
            let password = generate_password(&options).unwrap();
            assert_eq!(password.len(), 4);
            for pool in [LOWER, UPPER, DIGITS, SYMBOLS] {
                assert_eq!(count_in(&password, pool), 1);
            }
        }
    }

    #[test]
    fn test_length_clamped() {
        let short = GeneratorOptions {
            length: 1,
            ..GeneratorOptions::default()
        };
        let long = GeneratorOptions {
            length: 500,
            ..GeneratorOptions::default()
        };

        assert_eq!(generate_password(&short).unwrap().len(), MIN_LENGTH);
        assert_eq!(generate_password(&long).unwrap().len(), MAX_LENGTH);
    }

    #[test]
    fn test_single_class() {
        let options = GeneratorOptions {
            length: 32,
            lower: false,
            upper: false,
            digits: true,
            symbols: false,
        };

        let password = generate_password(&options).unwrap();
        assert!(password.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_no_class_rejected() {
        let options = GeneratorOptions {
            length: 16,
            lower: false,
            upper: false,
            digits: false,
            symbols: false,
        };

        assert!(matches!(
            generate_password(&options),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_outputs_differ() {
        let options = GeneratorOptions::default();
        let a = generate_password(&options).unwrap();
        let b = generate_password(&options).unwrap();
        assert_ne!(*a, *b);
    }
}
