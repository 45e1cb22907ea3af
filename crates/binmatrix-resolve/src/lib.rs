//! Runtime platform resolution for prebuilt binmatrix artifacts.
//!
//! Classifies a host descriptor into the canonical platform table and
//! computes the path its artifact is expected at. An override variable
//! short-circuits classification entirely.

pub mod error;
pub mod host;
pub mod resolver;

pub use error::{ResolveError, Result};
pub use host::{HostDescriptor, HostSignature};
pub use resolver::{Resolution, Resolver, ResolverConfig, ResolverEnv, DEBUG_ENV, OVERRIDE_ENV};
