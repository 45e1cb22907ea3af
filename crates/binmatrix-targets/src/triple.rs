//! Target triple model.
//!
//! A triple is one of a closed set of `{cpu, os, environment}` combinations.
//! Construction from a string only succeeds for members of that set, so a
//! `TargetTriple` value is always buildable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuArch {
    X86_64,
    Aarch64,
}

impl CpuArch {
    /// Architecture component as it appears in a Rust triple.
    pub fn as_str(self) -> &'static str {
        match self {
            CpuArch::X86_64 => "x86_64",
            CpuArch::Aarch64 => "aarch64",
        }
    }
}

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
}

impl OsFamily {
    /// Short family name used in canonical platform names.
    pub fn as_str(self) -> &'static str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
            OsFamily::Windows => "windows",
        }
    }

    /// Vendor and OS components of a Rust triple.
    fn vendor_os(self) -> &'static str {
        match self {
            OsFamily::Linux => "unknown-linux",
            OsFamily::MacOs => "apple-darwin",
            OsFamily::Windows => "pc-windows",
        }
    }

    /// OS family of the machine this code was compiled for.
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "linux" => Some(OsFamily::Linux),
            "macos" => Some(OsFamily::MacOs),
            "windows" => Some(OsFamily::Windows),
            _ => None,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Libc / ABI environment variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Gnu,
    Musl,
    Msvc,
    /// No environment component (Apple targets).
    None,
}

impl Environment {
    fn suffix(self) -> Option<&'static str> {
        match self {
            Environment::Gnu => Some("gnu"),
            Environment::Musl => Some("musl"),
            Environment::Msvc => Some("msvc"),
            Environment::None => None,
        }
    }
}

/// A supported target triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetTriple {
    cpu: CpuArch,
    os: OsFamily,
    env: Environment,
}

impl TargetTriple {
    pub const X86_64_LINUX_GNU: Self = Self::new_unchecked(CpuArch::X86_64, OsFamily::Linux, Environment::Gnu);
    pub const AARCH64_LINUX_GNU: Self = Self::new_unchecked(CpuArch::Aarch64, OsFamily::Linux, Environment::Gnu);
    pub const X86_64_LINUX_MUSL: Self = Self::new_unchecked(CpuArch::X86_64, OsFamily::Linux, Environment::Musl);
    pub const AARCH64_LINUX_MUSL: Self = Self::new_unchecked(CpuArch::Aarch64, OsFamily::Linux, Environment::Musl);
    pub const X86_64_MACOS: Self = Self::new_unchecked(CpuArch::X86_64, OsFamily::MacOs, Environment::None);
    pub const AARCH64_MACOS: Self = Self::new_unchecked(CpuArch::Aarch64, OsFamily::MacOs, Environment::None);
    pub const X86_64_WINDOWS: Self = Self::new_unchecked(CpuArch::X86_64, OsFamily::Windows, Environment::Msvc);
    pub const AARCH64_WINDOWS: Self = Self::new_unchecked(CpuArch::Aarch64, OsFamily::Windows, Environment::Msvc);

    /// Every supported triple, in the fixed build order.
    pub const ALL: [TargetTriple; 8] = [
        Self::X86_64_LINUX_GNU,
        Self::AARCH64_LINUX_GNU,
        Self::X86_64_LINUX_MUSL,
        Self::AARCH64_LINUX_MUSL,
        Self::X86_64_MACOS,
        Self::AARCH64_MACOS,
        Self::X86_64_WINDOWS,
        Self::AARCH64_WINDOWS,
    ];

    const fn new_unchecked(cpu: CpuArch, os: OsFamily, env: Environment) -> Self {
        Self { cpu, os, env }
    }

    /// Look up the supported triple for a component combination.
    pub fn from_parts(cpu: CpuArch, os: OsFamily, env: Environment) -> Option<Self> {
        let candidate = Self::new_unchecked(cpu, os, env);
        Self::ALL.into_iter().find(|t| *t == candidate)
    }

    pub fn cpu(&self) -> CpuArch {
        self.cpu
    }

    pub fn os(&self) -> OsFamily {
        self.os
    }

    pub fn env(&self) -> Environment {
        self.env
    }

    /// Whether this is a glibc Linux target.
    pub fn is_linux_gnu(&self) -> bool {
        self.os == OsFamily::Linux && self.env == Environment::Gnu
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.cpu.as_str(), self.os.vendor_os())?;
        if let Some(suffix) = self.env.suffix() {
            write!(f, "-{suffix}")?;
        }
        Ok(())
    }
}

impl FromStr for TargetTriple {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| TargetError::UnknownTriple {
                triple: s.to_string(),
            })
    }
}

impl TryFrom<String> for TargetTriple {
    type Error = TargetError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TargetTriple> for String {
    fn from(value: TargetTriple) -> Self {
        value.to_string()
    }
}
