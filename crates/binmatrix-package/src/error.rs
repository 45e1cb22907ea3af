//! Packaging error types.

use std::path::PathBuf;

/// Errors that can occur while packaging or unpacking artifacts.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// The raw artifact is not where the build was supposed to leave it,
    /// or a packaging write failed.
    #[error("packaging I/O failure at {}: {detail}", path.display())]
    PackagingIoFailure { path: PathBuf, detail: String },

    /// Packaged bytes do not match the checksum sidecar.
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Checksum sidecar is missing or unparseable.
    #[error("invalid checksum sidecar {}: {detail}", path.display())]
    InvalidSidecar { path: PathBuf, detail: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PackageError {
    pub(crate) fn io_at(path: &std::path::Path, err: std::io::Error) -> Self {
        PackageError::PackagingIoFailure {
            path: path.to_path_buf(),
            detail: err.to_string(),
        }
    }
}

/// Result type alias for packaging operations.
pub type Result<T> = std::result::Result<T, PackageError>;
