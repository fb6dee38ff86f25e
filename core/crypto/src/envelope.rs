//! Authenticated envelopes using AES-256-GCM.
//!
//! `encrypt` seals a payload into a [`CipherItem`] under a fresh random
//! 96-bit nonce; `decrypt` opens it again. The AEAD output `ct || tag` is
//! split so the tag travels in its own field, and joined back before opening.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::{Zeroize, Zeroizing};

use crate::item::{CipherItem, Meta};
use crate::keys::{MasterKeyMaterial, KEY_LENGTH};
use crate::random::fill_random;
use zkvault_common::{Error, Result};

/// Nonce size for AES-GCM (12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` into a new cipher item.
///
/// # Postconditions
/// - `plaintext` is overwritten with zeros, whether sealing succeeded or not
/// - `meta` is carried through unchanged
/// - the item has no id; the store assigns one
///
/// # Errors
/// - `Entropy` if no nonce could be drawn (fatal, do not retry)
/// - `InvalidKey` if the key is rejected by the cipher
pub fn encrypt(
    key: &MasterKeyMaterial,
    plaintext: &mut [u8],
    meta: Option<Meta>,
) -> Result<CipherItem> {
    encrypt_with_aad(key, plaintext, &[], meta)
}

/// Encrypt `plaintext`, binding the ciphertext to `aad`.
///
/// The same `aad` must be presented to [`decrypt_with_aad`]. It is not
/// stored in the item.
pub fn encrypt_with_aad(
    key: &MasterKeyMaterial,
    plaintext: &mut [u8],
    aad: &[u8],
    meta: Option<Meta>,
) -> Result<CipherItem> {
    let sealed = seal(key.as_bytes(), plaintext, aad);
    plaintext.zeroize();

    let (nonce, sealed) = sealed?;
    let (body, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

    Ok(CipherItem::from_parts(body, &nonce, tag, meta))
}

/// Decrypt a cipher item.
///
/// # Postconditions
/// - Returns the exact original plaintext, wiped when the buffer is dropped
///
/// # Errors
/// - `MalformedItem` if the item fields cannot be decoded
/// - `Authentication` if the tag does not verify (wrong key or tampered data,
///   deliberately not distinguished)
pub fn decrypt(key: &MasterKeyMaterial, item: &CipherItem) -> Result<Zeroizing<Vec<u8>>> {
    decrypt_with_aad(key, item, &[])
}

/// Decrypt a cipher item sealed with [`encrypt_with_aad`].
pub fn decrypt_with_aad(
    key: &MasterKeyMaterial,
    item: &CipherItem,
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let decoded = item.decode()?;
    let cipher = cipher_for(key.as_bytes())?;

    let mut sealed = Vec::with_capacity(decoded.body.len() + TAG_SIZE);
    sealed.extend_from_slice(&decoded.body);
    sealed.extend_from_slice(&decoded.tag);

    cipher
        .decrypt(
            Nonce::from_slice(&decoded.nonce),
            Payload {
                msg: &sealed,
                aad,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| Error::Authentication)
}

fn seal(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<([u8; NONCE_SIZE], Vec<u8>)> {
    let cipher = cipher_for(key)?;

    let mut nonce = [0u8; NONCE_SIZE];
    fill_random(&mut nonce)?;

    let sealed = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| Error::InvalidInput("Plaintext too large to seal".to_string()))?;

    Ok((nonce, sealed))
}

fn cipher_for(key: &[u8]) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key).map_err(|_| {
        Error::InvalidKey(format!(
            "expected {} bytes, got {}",
            KEY_LENGTH,
            key.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Salt;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::json;

    fn key(byte: u8) -> MasterKeyMaterial {
        MasterKeyMaterial::from_bytes([byte; KEY_LENGTH], Salt::from_slice(&[0u8; 16]).unwrap())
    }

    fn flip_bit(field: &str, index: usize, bit: u8) -> String {
        let mut bytes = STANDARD.decode(field).unwrap();
        bytes[index] ^= 1 << bit;
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = key(42);
        let mut plaintext = b"Hello, World!".to_vec();

        let item = encrypt(&key, &mut plaintext, None).unwrap();
        let decrypted = decrypt(&key, &item).unwrap();

        assert_eq!(decrypted.as_slice(), b"Hello, World!");
    }

    #[test]
    fn test_field_sizes() {
        let key = key(42);
        let mut plaintext = b"Test message".to_vec();

        let item = encrypt(&key, &mut plaintext, None).unwrap();

        assert_eq!(STANDARD.decode(&item.iv).unwrap().len(), NONCE_SIZE);
        assert_eq!(STANDARD.decode(&item.tag).unwrap().len(), TAG_SIZE);
        assert_eq!(STANDARD.decode(&item.ct).unwrap().len(), 12);
        assert!(item.id.is_none());
    }

    #[test]
    fn test_plaintext_buffer_zeroized() {
        let key = key(42);
        let mut plaintext = b"neelan:supersecret".to_vec();

        encrypt(&key, &mut plaintext, None).unwrap();

        assert_eq!(plaintext.len(), 18);
        assert!(plaintext.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_different_nonce_each_time() {
        let key = key(42);

        let item1 = encrypt(&key, &mut b"Same plaintext".to_vec(), None).unwrap();
        let item2 = encrypt(&key, &mut b"Same plaintext".to_vec(), None).unwrap();

        assert_ne!(item1.iv, item2.iv);
        assert_ne!(item1.ct, item2.ct);
    }

    #[test]
    fn test_meta_passed_through() {
        let key = key(42);
        let meta = json!({ "label": "email", "createdAt": 1700000000 })
            .as_object()
            .cloned();

        let item = encrypt(&key, &mut b"pw".to_vec(), meta.clone()).unwrap();

        assert_eq!(item.meta, meta);
        assert_eq!(item.label(), Some("email"));
    }

    #[test]
    fn test_wrong_key_fails() {
        let item = encrypt(&key(1), &mut b"Secret data".to_vec(), None).unwrap();
        let result = decrypt(&key(2), &item);

        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = key(42);
        let mut item = encrypt(&key, &mut b"Important data".to_vec(), None).unwrap();
        item.ct = flip_bit(&item.ct, 5, 0);

        assert!(matches!(decrypt(&key, &item), Err(Error::Authentication)));
    }

    #[test]
    fn test_tampered_tag_fails() {
        let key = key(42);
        let mut item = encrypt(&key, &mut b"Important data".to_vec(), None).unwrap();
        item.tag = flip_bit(&item.tag, TAG_SIZE - 1, 7);

        assert!(matches!(decrypt(&key, &item), Err(Error::Authentication)));
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let key = key(42);
        let mut item = encrypt(&key, &mut b"Important data".to_vec(), None).unwrap();
        item.iv = flip_bit(&item.iv, 0, 3);

        assert!(matches!(decrypt(&key, &item), Err(Error::Authentication)));
    }

    #[test]
    fn test_truncated_tag_is_malformed() {
        let key = key(42);
        let mut item = encrypt(&key, &mut b"data".to_vec(), None).unwrap();
        item.tag = STANDARD.encode([0u8; 8]);

        assert!(matches!(decrypt(&key, &item), Err(Error::MalformedItem(_))));
    }

    #[test]
    fn test_aad_must_match() {
        let key = key(42);
        let item = encrypt_with_aad(&key, &mut b"bound".to_vec(), b"user:neelan", None).unwrap();

        let opened = decrypt_with_aad(&key, &item, b"user:neelan").unwrap();
        assert_eq!(opened.as_slice(), b"bound");

        assert!(matches!(
            decrypt_with_aad(&key, &item, b"user:other"),
            Err(Error::Authentication)
        ));
        assert!(matches!(decrypt(&key, &item), Err(Error::Authentication)));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = key(42);

        let item = encrypt(&key, &mut [], None).unwrap();
        let decrypted = decrypt(&key, &item).unwrap();

        assert_eq!(item.ct, "");
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_large_plaintext() {
        let key = key(42);
        let mut plaintext = vec![0xABu8; 1_000_000]; // 1 MB

        let item = encrypt(&key, &mut plaintext, None).unwrap();
        let decrypted = decrypt(&key, &item).unwrap();

        assert_eq!(decrypted.as_slice(), vec![0xABu8; 1_000_000].as_slice());
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(matches!(cipher_for(&[0u8; 16]), Err(Error::InvalidKey(_))));
    }
}
