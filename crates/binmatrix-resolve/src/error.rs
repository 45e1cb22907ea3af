//! Resolution error types.

use std::path::PathBuf;

/// Errors that can occur while resolving the artifact for a host.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The host descriptor matches no supported platform. Callers must not
    /// fall back to another binary.
    #[error("unsupported platform: '{descriptor}'")]
    UnsupportedPlatform { descriptor: String },

    /// The resolved path does not exist on disk.
    #[error("no artifact for {platform} at {}", path.display())]
    ArtifactMissing { platform: String, path: PathBuf },
}

/// Result type alias for resolution.
pub type Result<T> = std::result::Result<T, ResolveError>;
