use base64::{engine::general_purpose::STANDARD, Engine as _};
use proptest::prelude::*;
use zkvault_common::Error;
use zkvault_crypto::{decrypt, derive_key, encrypt, KdfParams, MasterKeyMaterial, Salt, KEY_LENGTH};

fn key_from(bytes: [u8; KEY_LENGTH]) -> MasterKeyMaterial {
    MasterKeyMaterial::from_bytes(bytes, Salt::from_slice(&[9u8; 16]).unwrap())
}

fn flip(field: &str, bit: usize) -> String {
    let mut bytes = STANDARD.decode(field).unwrap();
    let index = bit / 8 % bytes.len();
    bytes[index] ^= 1 << (bit % 8);
    STANDARD.encode(bytes)
}

proptest! {
    #[test]
    fn roundtrip_arbitrary_bytes(
        key in any::<[u8; KEY_LENGTH]>(),
        data in proptest::collection::vec(any::<u8>(), 0..2048),
    ) {
        let key = key_from(key);
        let item = encrypt(&key, &mut data.clone(), None).unwrap();
        let opened = decrypt(&key, &item).unwrap();
        prop_assert_eq!(opened.as_slice(), data.as_slice());
    }

    #[test]
    fn same_plaintext_gets_fresh_nonce(
        key in any::<[u8; KEY_LENGTH]>(),
        data in proptest::collection::vec(any::<u8>(), 1..256),
    ) {
        let key = key_from(key);
        let first = encrypt(&key, &mut data.clone(), None).unwrap();
        let second = encrypt(&key, &mut data.clone(), None).unwrap();
        prop_assert_ne!(first.iv, second.iv);
    }

    #[test]
    fn single_bit_flip_in_ct_is_rejected(
        key in any::<[u8; KEY_LENGTH]>(),
        data in proptest::collection::vec(any::<u8>(), 1..512),
        bit in any::<usize>(),
    ) {
        let key = key_from(key);
        let mut item = encrypt(&key, &mut data.clone(), None).unwrap();
        item.ct = flip(&item.ct, bit);
        prop_assert!(matches!(decrypt(&key, &item), Err(Error::Authentication)));
    }

    #[test]
    fn single_bit_flip_in_tag_is_rejected(
        key in any::<[u8; KEY_LENGTH]>(),
        data in proptest::collection::vec(any::<u8>(), 0..512),
        bit in 0usize..128,
    ) {
        let key = key_from(key);
        let mut item = encrypt(&key, &mut data.clone(), None).unwrap();
        item.tag = flip(&item.tag, bit);
        prop_assert!(matches!(decrypt(&key, &item), Err(Error::Authentication)));
    }

    #[test]
    fn other_key_is_rejected(
        key in any::<[u8; KEY_LENGTH]>(),
        other in any::<[u8; KEY_LENGTH]>(),
        data in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        prop_assume!(key != other);
        let item = encrypt(&key_from(key), &mut data.clone(), None).unwrap();
        prop_assert!(matches!(decrypt(&key_from(other), &item), Err(Error::Authentication)));
    }
}

proptest! {
    // Argon2id at the floor still costs ~19 MiB per call; keep the case count low.
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn derivation_is_deterministic(
        password in proptest::collection::vec(any::<u8>(), 1..64),
        salt in proptest::collection::vec(any::<u8>(), 16..=32),
    ) {
        let salt = Salt::from_slice(&salt).unwrap();
        let params = KdfParams::minimum();
        let first = derive_key(&password, &salt, &params).unwrap();
        let second = derive_key(&password, &salt, &params).unwrap();
        prop_assert!(first.ct_eq(&second));
    }

    #[test]
    fn distinct_salts_give_distinct_keys(
        salt_a in any::<[u8; 16]>(),
        salt_b in any::<[u8; 16]>(),
    ) {
        prop_assume!(salt_a != salt_b);
        let params = KdfParams::minimum();
        let a = derive_key(b"same password", &Salt::from_slice(&salt_a).unwrap(), &params).unwrap();
        let b = derive_key(b"same password", &Salt::from_slice(&salt_b).unwrap(), &params).unwrap();
        prop_assert!(!a.ct_eq(&b));
    }
}
