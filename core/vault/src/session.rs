//! Vault session management.
//!
//! A session owns the key derived at login and is passed explicitly to
//! whatever needs to seal or open items; there is no global key. The key
//! is held in an `Arc`: locking drops the session's reference and the key
//! is zeroized once the last in-flight operation releases its clone.

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::{Zeroize, Zeroizing};

use zkvault_common::{Error, Identity, ItemId, Result};
use zkvault_crypto::{
    decrypt, derive_for_identity, encrypt, CipherItem, KdfParams, MasterKeyMaterial, Meta,
};
use zkvault_store::ItemStore;

/// Session handle for tracking active sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle(String);

impl SessionHandle {
    /// Generate a new unique session handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of the vault session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session is active and the key is available.
    Active,
    /// Session is locked, the key has been released.
    Locked,
}

/// Active vault session.
pub struct VaultSession {
    handle: SessionHandle,
    identity: Identity,
    kdf_params: KdfParams,
    key: Option<Arc<MasterKeyMaterial>>,
    store: Arc<dyn ItemStore>,
}

impl VaultSession {
    /// Derive the user's key and open a session.
    ///
    /// # Preconditions
    /// - `password` must not be empty
    ///
    /// # Postconditions
    /// - Returns an active session whose key is bound to `identity`
    /// - The password is not retained; wiping it is the caller's job
    ///
    /// # Errors
    /// - `Derivation` if the KDF rejects its inputs
    pub fn unlock(
        identity: Identity,
        password: &[u8],
        kdf_params: KdfParams,
        store: Arc<dyn ItemStore>,
    ) -> Result<Self> {
        let key = derive_for_identity(&identity, password, &kdf_params)?;
        let handle = SessionHandle::new();

        info!(session = %handle, store = store.name(), "Session unlocked");

        Ok(Self {
            handle,
            identity,
            kdf_params,
            key: Some(Arc::new(key)),
            store,
        })
    }

    /// Get the session handle.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Identity the key is bound to.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Get the item store.
    pub fn store(&self) -> Arc<dyn ItemStore> {
        self.store.clone()
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        if self.key.is_some() {
            SessionState::Active
        } else {
            SessionState::Locked
        }
    }

    /// Check if session is active.
    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Shared handle to the key for concurrent codec calls.
    ///
    /// # Errors
    /// - `NotPermitted` if the session is locked
    pub fn key(&self) -> Result<Arc<MasterKeyMaterial>> {
        self.key
            .clone()
            .ok_or_else(|| Error::NotPermitted("Session is locked".to_string()))
    }

    /// Check a password against the session key in constant time.
    pub fn verify_password(&self, password: &[u8]) -> Result<bool> {
        let key = self.key()?;
        let candidate = derive_for_identity(&self.identity, password, &self.kdf_params)?;
        Ok(key.ct_eq(&candidate))
    }

    /// Derive a new key from `password`, replacing the current one.
    ///
    /// The current key is released before deriving. If derivation fails the
    /// session stays locked.
    pub fn rekey(&mut self, password: &[u8]) -> Result<()> {
        self.key = None;
        let key = derive_for_identity(&self.identity, password, &self.kdf_params)?;
        self.key = Some(Arc::new(key));

        info!(session = %self.handle, "Session rekeyed");
        Ok(())
    }

    /// Encrypt `plaintext` and store the resulting item.
    ///
    /// `plaintext` is zeroized on every path, including a locked session,
    /// before the store is contacted.
    pub async fn encrypt_and_store(
        &self,
        plaintext: &mut [u8],
        meta: Option<Meta>,
    ) -> Result<ItemId> {
        let key = match self.key() {
            Ok(key) => key,
            Err(e) => {
                plaintext.zeroize();
                return Err(e);
            }
        };
        let item = encrypt(&key, plaintext, meta)?;
        let id = self.store.create(&item).await?;

        debug!(session = %self.handle, id = %id, "Item sealed and stored");
        Ok(id)
    }

    /// List stored items without decrypting them.
    pub async fn list_items(&self) -> Result<Vec<CipherItem>> {
        self.ensure_active()?;
        self.store.list().await
    }

    /// Decrypt an item with the session key.
    ///
    /// # Errors
    /// - `Authentication` if the item was sealed under another key or altered
    pub fn decrypt_item(&self, item: &CipherItem) -> Result<Zeroizing<Vec<u8>>> {
        decrypt(&*self.key()?, item)
    }

    /// Fetch an item by id and decrypt it.
    pub async fn get_and_decrypt(&self, id: &ItemId) -> Result<Zeroizing<Vec<u8>>> {
        self.ensure_active()?;
        let item = self.store.get(id).await?;
        self.decrypt_item(&item)
    }

    /// Delete an item from the store.
    pub async fn delete_item(&self, id: &ItemId) -> Result<()> {
        self.ensure_active()?;
        self.store.delete(id).await
    }

    /// Lock the session, releasing the key.
    ///
    /// # Postconditions
    /// - Session state is Locked and operations are refused
    /// - The key is zeroized as soon as no in-flight operation holds it
    pub fn lock(&mut self) {
        if self.key.take().is_some() {
            info!(session = %self.handle, "Session locked");
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::NotPermitted("Session is locked".to_string()))
        }
    }
}

impl Drop for VaultSession {
    fn drop(&mut self) {
        self.lock();
    }
}
