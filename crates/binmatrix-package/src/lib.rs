//! Artifact packaging for binmatrix.
//!
//! Compresses raw build outputs with gzip and writes a SHA-256 sidecar next
//! to each compressed file, under canonical collision-free names. The same
//! sidecar is checked again when a packaged artifact is unpacked.

pub mod checksum;
pub mod error;
pub mod packager;

pub use checksum::Checksum;
pub use error::{PackageError, Result};
pub use packager::{unpack, verify, Artifact, Packager};
