//! Item store trait definition.

use async_trait::async_trait;

use zkvault_common::{Error, ItemId, Result};
use zkvault_crypto::CipherItem;

/// Backend holding cipher items.
///
/// Implementations store items verbatim and never see key material or
/// plaintext. Authentication and rate limiting are their own business.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Get the store name (e.g., "memory", "http").
    fn name(&self) -> &str;

    /// Store a new item.
    ///
    /// # Postconditions
    /// - The stored copy carries the returned id; any id on `item` is ignored
    ///
    /// # Errors
    /// - `InvalidInput` if a required field is empty
    /// - Network/storage errors
    async fn create(&self, item: &CipherItem) -> Result<ItemId>;

    /// List all items in creation order.
    async fn list(&self) -> Result<Vec<CipherItem>>;

    /// Fetch one item.
    ///
    /// # Errors
    /// - `NotFound` if no item has this id
    async fn get(&self, id: &ItemId) -> Result<CipherItem>;

    /// Delete one item.
    ///
    /// # Errors
    /// - `NotFound` if no item has this id
    async fn delete(&self, id: &ItemId) -> Result<()>;
}

/// Reject items the store would refuse: `ct`, `iv` and `tag` must be non-empty.
pub fn validate_item(item: &CipherItem) -> Result<()> {
    for (name, value) in [("ct", &item.ct), ("iv", &item.iv), ("tag", &item.tag)] {
        if value.is_empty() {
            return Err(Error::InvalidInput(format!("{} cannot be empty", name)));
        }
    }
    Ok(())
}
