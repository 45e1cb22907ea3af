//! Canonical platform names.
//!
//! The name table is the contract shared by the packaging side and the
//! runtime resolver. Both sides derive names through [`platform_name`], so
//! a triple can only ever map to one name.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TargetError};
use crate::triple::{CpuArch, Environment, OsFamily, TargetTriple};

/// Version of the canonical name table. Bumped only when a name changes,
/// independent of the crate version.
pub const PLATFORM_TABLE_VERSION: u32 = 1;

/// A canonical platform name such as `linux-aarch64-musl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformName {
    name: &'static str,
    triple: TargetTriple,
}

impl PlatformName {
    pub fn as_str(&self) -> &'static str {
        self.name
    }

    /// The triple this name was derived from.
    pub fn triple(&self) -> TargetTriple {
        self.triple
    }
}

impl fmt::Display for PlatformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl FromStr for PlatformName {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        TargetTriple::ALL
            .into_iter()
            .map(platform_name)
            .find(|name| name.as_str() == s)
            .ok_or_else(|| TargetError::UnknownPlatform { name: s.to_string() })
    }
}

/// Canonical platform name for a triple.
pub fn platform_name(triple: TargetTriple) -> PlatformName {
    let name = match (triple.os(), triple.cpu(), triple.env()) {
        (OsFamily::Linux, CpuArch::X86_64, Environment::Musl) => "linux-x86_64-musl",
        (OsFamily::Linux, CpuArch::Aarch64, Environment::Musl) => "linux-aarch64-musl",
        (OsFamily::Linux, CpuArch::X86_64, _) => "linux-x86_64",
        (OsFamily::Linux, CpuArch::Aarch64, _) => "linux-aarch64",
        (OsFamily::MacOs, CpuArch::X86_64, _) => "macos-x86_64",
        (OsFamily::MacOs, CpuArch::Aarch64, _) => "macos-aarch64",
        (OsFamily::Windows, CpuArch::X86_64, _) => "windows-x86_64",
        (OsFamily::Windows, CpuArch::Aarch64, _) => "windows-aarch64",
    };
    PlatformName { name, triple }
}

/// The full name table, one row per supported triple, in build order.
pub fn platform_table() -> Vec<(TargetTriple, PlatformName)> {
    TargetTriple::ALL
        .into_iter()
        .map(|t| (t, platform_name(t)))
        .collect()
}
