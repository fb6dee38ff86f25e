//! Zero-knowledge vault cryptography core.
//!
//! This module provides:
//! - Key derivation using Argon2id
//! - Authenticated envelopes ("cipher items") using AES-256-GCM
//! - Key material that zeroizes itself on drop
//! - A password generator backed by the OS random source
//!
//! # Security Guarantees
//! - Key material is never serialized or logged and is zeroized on drop
//! - Every encryption uses a fresh random 96-bit nonce
//! - Decryption never returns unauthenticated plaintext
//! - Wrong key and tampered data fail with the same error

pub mod envelope;
pub mod generator;
pub mod item;
pub mod kdf;
pub mod keys;
mod random;

pub use envelope::{decrypt, decrypt_with_aad, encrypt, encrypt_with_aad, NONCE_SIZE, TAG_SIZE};
pub use generator::{generate_password, GeneratorOptions};
pub use item::{CipherItem, Meta};
pub use kdf::{derive_for_identity, derive_key, KdfParams};
pub use keys::{MasterKeyMaterial, Salt, KEY_LENGTH};
