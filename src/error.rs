//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Operation required a live item and found none
    #[error("Item {0} not found")]
    NotFound(String),

    /// Conditional add found a live item already present
    #[error("Item {0} already exists")]
    AlreadyExists(String),

    /// Numeric mutation on a value that cannot accept the delta
    #[error("The value for {key} is a {kind} and cannot accept this delta")]
    WrongType { key: String, kind: &'static str },

    /// Snapshot could not be encoded or decoded
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot was written by an incompatible format version
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedSnapshotVersion(u32),

    /// Snapshot file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A janitor was requested outside of a Tokio runtime
    #[error("Cleanup interval is set but no Tokio runtime is available")]
    NoRuntime,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
