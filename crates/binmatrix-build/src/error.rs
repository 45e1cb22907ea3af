//! Build orchestration errors.

use binmatrix_package::PackageError;
use binmatrix_targets::TargetError;
use thiserror::Error;

use crate::state::BuildState;

/// Errors that can occur while planning or running a build batch.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Toolchain (or header tool) is unavailable even after one install attempt.
    #[error("toolchain '{toolchain}' missing for {triple}: {detail}")]
    ToolchainMissing {
        toolchain: String,
        triple: String,
        detail: String,
    },

    /// A toolchain invocation exited nonzero.
    #[error("{stage} failed for {triple} (exit status {status})")]
    BuildFailure {
        triple: String,
        stage: String,
        status: i32,
    },

    /// Triple is not part of the target matrix.
    #[error("unknown target triple: '{triple}'")]
    UnknownTriple { triple: String },

    /// Distribution policy excludes this triple.
    #[error("{triple} is excluded by the musl-only distribution policy; build {alternative} instead")]
    PolicyExcluded { triple: String, alternative: String },

    /// Header generation runs with the primary triple, which the policy excludes.
    #[error("header generation needs primary {triple}, which the musl-only policy excludes; make {alternative} the primary")]
    PrimaryExcluded { triple: String, alternative: String },

    /// The machine running the build is not a supported OS family.
    #[error("unsupported build host OS: {os}")]
    UnsupportedHost { os: String },

    /// Internal state machine violation.
    #[error("invalid state transition for {triple}: {from:?} -> {to:?}")]
    InvalidTransition {
        triple: String,
        from: BuildState,
        to: BuildState,
    },

    /// Could not start a toolchain process at all.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Target(TargetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TargetError> for BuildError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::UnknownTriple { triple } => BuildError::UnknownTriple { triple },
            other => BuildError::Target(other),
        }
    }
}

/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
