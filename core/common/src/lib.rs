//! Common types shared across the zkvault crates.
//!
//! Holds the error taxonomy used by the crypto core, the item store client
//! and the session layer, plus a handful of small value types.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Identity, ItemId, SensitiveBytes};
