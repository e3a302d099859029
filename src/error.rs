//! Error types for GMA decoding and extraction.

use thiserror::Error;

/// Errors that can occur when reading or extracting a GMA addon.
#[derive(Debug, Error)]
pub enum GmaError {
    /// The first four bytes are not `GMAD`.
    #[error("not a valid GMA file: bad magic {0:02x?}")]
    InvalidMagic([u8; 4]),

    /// The format version is newer than this decoder understands.
    #[error("unsupported addon version: {0}")]
    UnsupportedVersion(u8),

    /// Read, seek or write failure against the source or the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry name escapes the destination directory (only with path confinement).
    #[error("entry path escapes destination: {0}")]
    UnsafePath(String),

    /// An extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Task(String),
}

impl GmaError {
    /// Whether the input itself is permanently invalid (bad magic or version).
    pub fn is_format_error(&self) -> bool {
        matches!(self, GmaError::InvalidMagic(_) | GmaError::UnsupportedVersion(_))
    }
}

/// Result type for GMA operations.
pub type Result<T> = std::result::Result<T, GmaError>;
