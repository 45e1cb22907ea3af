//! Host descriptors and their classification.
//!
//! A descriptor is a free-form platform string such as
//! `aarch64-unknown-linux-musl`, `linux-x86_64` or `arm64-apple-darwin23`.
//! It is tokenized once into `{os, cpu, libc}` and the result is mapped to
//! a supported triple by an exhaustive match. The musl variant is picked
//! whenever a musl marker is present, regardless of token order.

use std::fmt;

use binmatrix_targets::{platform_name, CpuArch, Environment, OsFamily, PlatformName, TargetTriple};
use serde::Serialize;

use crate::error::{ResolveError, Result};

/// Raw platform-descriptor string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostDescriptor(String);

impl HostDescriptor {
    pub fn new(raw: impl Into<String>) -> Self {
        HostDescriptor(raw.into())
    }

    /// Descriptor for the running process, built from the platform it was
    /// compiled for: `<arch>-<vendor>-<os>[-<env>]`.
    pub fn current() -> Self {
        let (vendor, os) = match std::env::consts::OS {
            "macos" => ("apple", "darwin"),
            "windows" => ("pc", "windows"),
            other => ("unknown", other),
        };
        let env = if cfg!(target_env = "musl") {
            "-musl"
        } else if cfg!(target_env = "gnu") {
            "-gnu"
        } else if cfg!(target_env = "msvc") {
            "-msvc"
        } else {
            ""
        };
        HostDescriptor(format!("{}-{vendor}-{os}{env}", std::env::consts::ARCH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured classification of a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSignature {
    pub raw_descriptor: String,
    pub os_family: OsFamily,
    pub cpu_arch: CpuArch,
    pub libc_variant: Environment,
}

impl HostSignature {
    /// Parse a descriptor. Every token must be a known CPU, vendor, OS or
    /// environment, and the environment must fit the OS; anything else
    /// (`ios`, `android`, `gnux32`, `uclibc`, ...) fails with
    /// `UnsupportedPlatform` carrying the raw descriptor.
    pub fn classify(descriptor: &HostDescriptor) -> Result<Self> {
        let raw = descriptor.as_str();
        let unsupported = || ResolveError::UnsupportedPlatform {
            descriptor: raw.to_string(),
        };

        let mut os = None;
        let mut cpu = None;
        let mut env = None;
        let lower = raw.to_ascii_lowercase();
        for token in lower
            .split(|c: char| c == '-' || c == '/' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            match parse_token(token).ok_or_else(unsupported)? {
                Token::Cpu(c) => set_once(&mut cpu, c).ok_or_else(unsupported)?,
                Token::Os(o) => set_once(&mut os, o).ok_or_else(unsupported)?,
                Token::Env(e) => set_once(&mut env, e).ok_or_else(unsupported)?,
                Token::Vendor => {}
            }
        }
        let (Some(os_family), Some(cpu_arch)) = (os, cpu) else {
            return Err(unsupported());
        };

        let libc_variant = match (os_family, env) {
            (OsFamily::Linux, None | Some(Environment::Gnu)) => Environment::Gnu,
            (OsFamily::Linux, Some(Environment::Musl)) => Environment::Musl,
            (OsFamily::MacOs, None) => Environment::None,
            (OsFamily::Windows, None | Some(Environment::Msvc)) => Environment::Msvc,
            _ => return Err(unsupported()),
        };

        Ok(HostSignature {
            raw_descriptor: raw.to_string(),
            os_family,
            cpu_arch,
            libc_variant,
        })
    }

    /// The supported triple whose artifacts run on this host.
    pub fn triple(&self) -> TargetTriple {
        let musl = self.libc_variant == Environment::Musl;
        match (self.os_family, self.cpu_arch, musl) {
            (OsFamily::Linux, CpuArch::X86_64, true) => TargetTriple::X86_64_LINUX_MUSL,
            (OsFamily::Linux, CpuArch::Aarch64, true) => TargetTriple::AARCH64_LINUX_MUSL,
            (OsFamily::Linux, CpuArch::X86_64, false) => TargetTriple::X86_64_LINUX_GNU,
            (OsFamily::Linux, CpuArch::Aarch64, false) => TargetTriple::AARCH64_LINUX_GNU,
            (OsFamily::MacOs, CpuArch::X86_64, _) => TargetTriple::X86_64_MACOS,
            (OsFamily::MacOs, CpuArch::Aarch64, _) => TargetTriple::AARCH64_MACOS,
            (OsFamily::Windows, CpuArch::X86_64, _) => TargetTriple::X86_64_WINDOWS,
            (OsFamily::Windows, CpuArch::Aarch64, _) => TargetTriple::AARCH64_WINDOWS,
        }
    }

    pub fn platform(&self) -> PlatformName {
        platform_name(self.triple())
    }
}

enum Token {
    Cpu(CpuArch),
    Os(OsFamily),
    Env(Environment),
    Vendor,
}

fn parse_token(token: &str) -> Option<Token> {
    let parsed = match token {
        "x86_64" | "amd64" | "x64" => Token::Cpu(CpuArch::X86_64),
        "aarch64" | "arm64" => Token::Cpu(CpuArch::Aarch64),
        "linux" => Token::Os(OsFamily::Linux),
        "macos" | "osx" => Token::Os(OsFamily::MacOs),
        t if t.starts_with("darwin") && t[6..].chars().all(|c| c.is_ascii_digit() || c == '.') => {
            Token::Os(OsFamily::MacOs)
        }
        "windows" | "win32" | "win64" => Token::Os(OsFamily::Windows),
        "gnu" => Token::Env(Environment::Gnu),
        "musl" => Token::Env(Environment::Musl),
        "msvc" => Token::Env(Environment::Msvc),
        "unknown" | "pc" | "apple" | "alpine" => Token::Vendor,
        _ => return None,
    };
    Some(parsed)
}

/// Record a component; a second, different value is a conflict.
fn set_once<T: PartialEq>(slot: &mut Option<T>, value: T) -> Option<()> {
    match slot {
        Some(existing) if *existing != value => None,
        _ => {
            *slot = Some(value);
            Some(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform_of(raw: &str) -> String {
        HostSignature::classify(&HostDescriptor::new(raw))
            .unwrap()
            .platform()
            .to_string()
    }

    #[test]
    fn every_supported_triple_classifies_to_its_own_name() {
        for triple in TargetTriple::ALL {
            let sig = HostSignature::classify(&HostDescriptor::new(triple.to_string())).unwrap();
            assert_eq!(sig.triple(), triple);
            assert_eq!(sig.platform(), platform_name(triple));
        }
    }

    #[test]
    fn musl_arm_is_not_generic_linux() {
        assert_eq!(platform_of("aarch64-unknown-linux-musl"), "linux-aarch64-musl");
        assert_eq!(platform_of("x86_64-alpine-linux-musl"), "linux-x86_64-musl");
        assert_eq!(platform_of("linux-musl-arm64"), "linux-aarch64-musl");
        assert_ne!(platform_of("aarch64-unknown-linux-musl"), "linux-x86_64");
    }

    #[test]
    fn alternative_spellings() {
        assert_eq!(platform_of("linux-x86_64"), "linux-x86_64");
        assert_eq!(platform_of("Linux x86_64"), "linux-x86_64");
        assert_eq!(platform_of("arm64-apple-darwin23.1.0"), "macos-aarch64");
        assert_eq!(platform_of("darwin-x64"), "macos-x86_64");
        assert_eq!(platform_of("win32-x64"), "windows-x86_64");
        assert_eq!(platform_of("osx-arm64"), "macos-aarch64");
        assert_eq!(platform_of("aarch64-unknown-linux-gnu"), "linux-aarch64");
    }

    #[test]
    fn unrecognized_descriptor_carries_raw_text() {
        let err = HostSignature::classify(&HostDescriptor::new("sparc64-unknown-unknown")).unwrap_err();
        assert!(err.to_string().contains("sparc64-unknown-unknown"));

        assert!(HostSignature::classify(&HostDescriptor::new("riscv64gc-unknown-linux-gnu")).is_err());
        assert!(HostSignature::classify(&HostDescriptor::new("x86_64-unknown-freebsd")).is_err());
        assert!(HostSignature::classify(&HostDescriptor::new("")).is_err());

        for foreign in [
            "aarch64-linux-android",
            "aarch64-apple-ios",
            "x86_64-apple-ios-sim",
            "x86_64-unknown-linux-gnux32",
            "x86_64-unknown-linux-uclibc",
            "x86_64-pc-windows-gnu",
            "aarch64-apple-darwin-musl",
            "x86_64-apple",
            "linux-windows-x86_64",
            "x86_64-aarch64-linux",
        ] {
            let err = HostSignature::classify(&HostDescriptor::new(foreign)).unwrap_err();
            assert!(err.to_string().contains(foreign), "{foreign}");
        }
    }

    #[test]
    fn current_descriptor_has_arch_and_os() {
        let d = HostDescriptor::current();
        assert!(d.as_str().starts_with(std::env::consts::ARCH));
    }
}
