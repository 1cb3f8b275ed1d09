//! Error types for the social-store crate.

use thiserror::Error;

/// Errors that can occur while loading or validating feed data
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error occurred while reading a feed file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Feed file couldn't be deserialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Referenced entity doesn't exist (e.g., interaction with a missing post)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: &'static str, id: u32 },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, StoreError>;
