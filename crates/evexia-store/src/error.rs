//! Error types for local storage operations.

/// Error type for local storage operations.
///
/// The entity cache itself never fails; only persisted storage can.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to read the storage file.
    #[error("failed to read storage file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write the storage file.
    #[error("failed to write storage file '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    /// Storage file contents are not a JSON object of strings.
    #[error("failed to parse storage file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    /// Failed to serialize storage contents.
    #[error("failed to serialize storage: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for local storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
