//! Target matrix and naming contract for binmatrix.
//!
//! Everything both sides of the distribution pipeline must agree on lives
//! here:
//! - **Triples:** the closed set of supported `{cpu, os, environment}` targets
//! - **Platform names:** the canonical name table shared by packager and resolver
//! - **Artifacts:** kinds, build modes, raw output paths, packaged file names
//! - **Matrix:** build order, special-case flags, toolchain selection

pub mod artifact;
pub mod error;
pub mod matrix;
pub mod platform;
pub mod triple;

pub use artifact::{ArtifactKind, BuildMode};
pub use error::{Result, TargetError};
pub use matrix::{BuildConfiguration, LinuxGnuPolicy, TargetEntry, TargetMatrix, TargetOverride, Toolchain};
pub use platform::{platform_name, PlatformName, PLATFORM_TABLE_VERSION};
pub use triple::{CpuArch, Environment, OsFamily, TargetTriple};
