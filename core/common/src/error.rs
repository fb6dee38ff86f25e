//! Error taxonomy for zkvault.

use thiserror::Error;

/// Top-level error type for zkvault operations.
///
/// The first group of variants belongs to the cryptographic core and is
/// never retryable. The remaining variants cover the collaborators around it.
#[derive(Debug, Error)]
pub enum Error {
    /// Key derivation rejected its inputs or the primitive failed.
    #[error("Key derivation error: {0}")]
    Derivation(String),

    /// No secure randomness available.
    #[error("Entropy source unavailable: {0}")]
    Entropy(String),

    /// Key material of the wrong length was handed to the codec.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Tag verification failed. Wrong key and tampered data are reported
    /// identically.
    #[error("Authentication failed")]
    Authentication,

    /// A cipher item could not be decoded (bad base64, wrong nonce or tag length).
    #[error("Malformed cipher item: {0}")]
    MalformedItem(String),

    /// Item store operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Network request to the item store failed.
    #[error("Network error: {0}")]
    Network(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not permitted.
    #[error("Not permitted: {0}")]
    NotPermitted(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether the failure is transient and the operation may be attempted again.
    ///
    /// Only transport failures qualify. Cryptographic failures are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Io(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
