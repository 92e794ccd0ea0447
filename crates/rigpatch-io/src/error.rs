//! Error types for rig file I/O.

/// Result type alias for rig file operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Error type for loading and saving rig files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON parse failed
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON serialization failed
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    /// File extension is neither JSON nor RON
    #[error("Unsupported rig file format: {0}")]
    UnsupportedFormat(String),

    /// File exceeds the load limit
    #[error("Rig file is {size} bytes, limit is {limit} bytes")]
    FileTooLarge {
        /// File size in bytes
        size: u64,
        /// Limit in bytes
        limit: u64,
    },

    /// File was written by an incompatible version
    #[error("Rig file version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build reads
        expected: String,
        /// Version stored in the file
        found: String,
    },

    /// Two devices share an id
    #[error("Duplicate device id '{0}'")]
    DuplicateDevice(String),
}
