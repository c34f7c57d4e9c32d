//! Error types for JSON store operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during `JsonStore` operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Collection file exists but does not hold a JSON array.
    #[error("{path} does not contain a JSON array")]
    NotAnArray {
        /// Offending file.
        path: PathBuf,
    },

    /// Collection file is not valid JSON.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Records could not be encoded.
    #[error("Failed to serialize records: {0}")]
    Serialize(#[source] serde_json::Error),

    /// I/O operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Unknown collection name.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Failed to acquire the cache lock.
    #[error("Store cache lock error")]
    LockError,
}
