//! Client-side vault session for zkvault.
//!
//! This module provides:
//! - Configuration loading (defaults, JSON file, environment)
//! - An explicit session handle that owns the derived key
//! - Encrypt-and-store / fetch-and-decrypt on top of an item store
//!
//! # Architecture
//! The session sits between the caller and the item store. Only cipher
//! items cross into the store; the key never leaves the session except as
//! a shared `Arc` handed to concurrent codec calls.

pub mod config;
pub mod session;

pub use config::VaultConfig;
pub use session::{SessionHandle, SessionState, VaultSession};
