//! Client side of the vault item store.
//!
//! The store only ever sees [`CipherItem`](zkvault_crypto::CipherItem)
//! values. This module provides:
//! - The [`ItemStore`] trait every backend implements
//! - An in-memory store for tests and development
//! - An HTTP store speaking the `/vault/items` JSON protocol
//! - Retry with exponential backoff for transient transport failures

pub mod http;
pub mod memory;
pub mod provider;
pub mod retry;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use provider::{validate_item, ItemStore};
pub use retry::{RetryConfig, RetryExecutor};
