//! Error types for target matrix operations.

/// Errors that can occur while resolving or validating the target matrix.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Triple string is not part of the closed target set.
    #[error("unknown target triple: '{triple}'")]
    UnknownTriple {
        /// The rejected triple string.
        triple: String,
    },

    /// Canonical platform name does not belong to any supported triple.
    #[error("unknown platform name: '{name}'")]
    UnknownPlatform {
        /// The rejected platform name.
        name: String,
    },

    /// Two matrix entries describe the same triple.
    #[error("duplicate target triple in matrix: {triple}")]
    DuplicateTriple {
        /// The repeated triple.
        triple: String,
    },

    /// Two matrix entries would produce the same canonical name.
    #[error("canonical name '{name}' produced by both {first} and {second}")]
    NameCollision {
        /// The colliding platform name.
        name: String,
        /// First triple producing it.
        first: String,
        /// Second triple producing it.
        second: String,
    },

    /// Artifact kind string is not recognized.
    #[error("unknown artifact kind: '{kind}' (expected static_lib, dynamic_lib, header, or executable)")]
    UnknownKind {
        /// The rejected kind string.
        kind: String,
    },

    /// Matrix or configuration violates a structural rule.
    #[error("validation error: {detail}")]
    Validation {
        /// Description of the validation failure.
        detail: String,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
