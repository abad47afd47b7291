//! Error types for StashKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StashError
pub type Result<T> = std::result::Result<T, StashError>;

/// Unified error type for StashKV operations
#[derive(Debug, Error)]
pub enum StashError {
    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Failed to open store at {location}: {reason}")]
    Open { location: String, reason: String },

    #[error("Store already open with {active}, refusing {requested}")]
    ConfigMismatch { requested: String, active: String },

    // -------------------------------------------------------------------------
    // Operation Errors
    // -------------------------------------------------------------------------
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Scan failed: {0}")]
    Scan(String),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt record: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Edge Errors
    // -------------------------------------------------------------------------
    #[error("Invalid TTL: {0} seconds (must be >= 0)")]
    InvalidTtl(i64),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl StashError {
    /// Build a `NotFound` error naming the key (lossy UTF-8)
    pub fn not_found(key: &[u8]) -> Self {
        StashError::NotFound(String::from_utf8_lossy(key).into_owned())
    }

    /// Whether this error is the expected "no live value" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, StashError::NotFound(_))
    }
}
