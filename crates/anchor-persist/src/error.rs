//! Store error types.

use thiserror::Error;

/// Store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// LMDB error.
    #[error("database error: {0}")]
    Database(#[from] heed::Error),

    /// Record encoding error.
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// No catalog entry with this name.
    #[error("unknown data store '{name}', available: {available:?}")]
    UnknownDataStore { name: String, available: Vec<String> },

    /// The factory for a catalog entry failed.
    #[error("couldn't instantiate data store {name}")]
    Instantiate {
        name: String,
        #[source]
        source: Box<StoreError>,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
