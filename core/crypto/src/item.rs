//! Wire and storage format of an encrypted envelope.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::envelope::{NONCE_SIZE, TAG_SIZE};
use zkvault_common::{Error, ItemId, Result};

/// Open, non-secret metadata carried next to the ciphertext.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Encrypted envelope as stored by the item store.
///
/// `ct`, `iv` and `tag` are standard base64 (padded, no line wrapping).
/// The store treats the whole value as opaque and returns it unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CipherItem {
    /// Assigned by the store; absent until the item has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    /// Ciphertext body, same length as the plaintext.
    pub ct: String,
    /// 12-byte AES-GCM nonce.
    pub iv: String,
    /// 16-byte authentication tag.
    pub tag: String,
    /// Caller metadata. Never holds plaintext secrets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Binary form of a decoded envelope.
pub(crate) struct DecodedItem {
    pub body: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
}

impl CipherItem {
    pub(crate) fn from_parts(
        body: &[u8],
        nonce: &[u8; NONCE_SIZE],
        tag: &[u8],
        meta: Option<Meta>,
    ) -> Self {
        Self {
            id: None,
            ct: STANDARD.encode(body),
            iv: STANDARD.encode(nonce),
            tag: STANDARD.encode(tag),
            meta,
        }
    }

    /// Decode the base64 fields and check the fixed lengths.
    ///
    /// # Errors
    /// - `MalformedItem` if any field is not valid base64 or has the wrong length
    pub(crate) fn decode(&self) -> Result<DecodedItem> {
        let body = decode_field("ct", &self.ct)?;

        let nonce: [u8; NONCE_SIZE] = decode_field("iv", &self.iv)?
            .try_into()
            .map_err(|v: Vec<u8>| {
                Error::MalformedItem(format!("iv must be {} bytes, got {}", NONCE_SIZE, v.len()))
            })?;

        let tag: [u8; TAG_SIZE] = decode_field("tag", &self.tag)?
            .try_into()
            .map_err(|v: Vec<u8>| {
                Error::MalformedItem(format!("tag must be {} bytes, got {}", TAG_SIZE, v.len()))
            })?;

        Ok(DecodedItem { body, nonce, tag })
    }

    /// Return the item with the store-assigned id attached.
    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    /// The `label` metadata entry, if it is a string.
    pub fn label(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get("label"))
            .and_then(|value| value.as_str())
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| Error::MalformedItem(format!("{} is not valid base64: {}", name, e)))
}
