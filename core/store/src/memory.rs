//! In-memory item store for testing.

use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

use crate::provider::{validate_item, ItemStore};
use zkvault_common::{Error, ItemId, Result};
use zkvault_crypto::CipherItem;

/// In-memory item store.
///
/// Useful for testing and development. Items are kept in creation order
/// and lost on drop. Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryStore {
    items: Arc<RwLock<Vec<CipherItem>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Whether the store holds no items.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<CipherItem>>> {
        self.items
            .read()
            .map_err(|_| Error::Storage("Item store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<CipherItem>>> {
        self.items
            .write()
            .map_err(|_| Error::Storage("Item store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, item: &CipherItem) -> Result<ItemId> {
        validate_item(item)?;

        let id = ItemId::new(Uuid::new_v4().to_string())?;
        let stored = item.clone().with_id(id.clone());
        self.write()?.push(stored);

        debug!(id = %id, "Item stored");
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<CipherItem>> {
        Ok(self.read()?.clone())
    }

    async fn get(&self, id: &ItemId) -> Result<CipherItem> {
        self.read()?
            .iter()
            .find(|item| item.id.as_ref() == Some(id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Item not found: {}", id)))
    }

    async fn delete(&self, id: &ItemId) -> Result<()> {
        let mut items = self.write()?;
        let before = items.len();
        items.retain(|item| item.id.as_ref() != Some(id));

        if items.len() == before {
            return Err(Error::NotFound(format!("Item not found: {}", id)));
        }
        debug!(id = %id, "Item deleted");
        Ok(())
    }
}
