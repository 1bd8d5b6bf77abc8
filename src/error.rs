//! Error types for shelfdb
//!
//! Provides a unified error type for all store operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for shelfdb operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Logical rejections (no mutation applied)
    // -------------------------------------------------------------------------
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No live record '{id}' in table '{table}'")]
    NotFound { table: String, id: String },

    #[error("Key '{id}' already taken in table '{table}'")]
    DuplicateKey { table: String, id: String },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Inconsistent journal: {0}")]
    InconsistentJournal(String),

    #[error("Table '{table}' is unusable: {reason}")]
    TableFailed { table: String, reason: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Errors after which the owning table must not be used again
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Storage(_) | StoreError::InconsistentJournal(_))
    }

    /// Errors caused by the request itself; retrying unchanged fails the same way
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::NotFound { .. } | StoreError::DuplicateKey { .. }
        )
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        StoreError::Validation(reason.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
