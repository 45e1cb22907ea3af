//! Artifact kinds, build modes, and file naming.
//!
//! Raw output paths follow the cargo target-dir layout:
//!
//! ```text
//! <target_dir>/<triple>/<debug|release>/<file name>
//! ```
//!
//! Packaged names are `<app>-<platform>.<ext>.gz`, with a `.sha256` sidecar.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};
use crate::platform::PlatformName;
use crate::triple::{OsFamily, TargetTriple};

/// Suffix appended to compressed artifacts.
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// Suffix appended to checksum sidecars.
pub const CHECKSUM_SUFFIX: &str = ".sha256";

/// Cargo build profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl BuildMode {
    pub fn from_release_flag(release: bool) -> Self {
        if release {
            BuildMode::Release
        } else {
            BuildMode::Debug
        }
    }

    /// Output subdirectory name.
    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of produced artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    StaticLib,
    DynamicLib,
    Header,
    /// Companion command-line binary.
    Executable,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::StaticLib => "static_lib",
            ArtifactKind::DynamicLib => "dynamic_lib",
            ArtifactKind::Header => "header",
            ArtifactKind::Executable => "executable",
        }
    }

    /// Whether the kind is produced by the compiler (as opposed to the
    /// header emitter).
    pub fn is_compiled(self) -> bool {
        !matches!(self, ArtifactKind::Header)
    }

    /// Extension used in packaged names. Empty for unix executables.
    pub fn extension(self, os: OsFamily) -> &'static str {
        match (self, os) {
            (ArtifactKind::DynamicLib, OsFamily::Linux) => "so",
            (ArtifactKind::DynamicLib, OsFamily::MacOs) => "dylib",
            (ArtifactKind::DynamicLib, OsFamily::Windows) => "dll",
            (ArtifactKind::StaticLib, OsFamily::Windows) => "lib",
            (ArtifactKind::StaticLib, _) => "a",
            (ArtifactKind::Header, _) => "h",
            (ArtifactKind::Executable, OsFamily::Windows) => "exe",
            (ArtifactKind::Executable, _) => "",
        }
    }

    /// File name the toolchain produces for `app` on `os`.
    pub fn file_name(self, app: &str, os: OsFamily) -> String {
        let prefix = match (self, os) {
            (ArtifactKind::DynamicLib | ArtifactKind::StaticLib, OsFamily::Linux | OsFamily::MacOs) => "lib",
            _ => "",
        };
        with_extension(format!("{prefix}{app}"), self.extension(os))
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "static_lib" | "staticlib" => Ok(ArtifactKind::StaticLib),
            "dynamic_lib" | "cdylib" => Ok(ArtifactKind::DynamicLib),
            "header" => Ok(ArtifactKind::Header),
            "executable" | "bin" => Ok(ArtifactKind::Executable),
            other => Err(TargetError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}

fn with_extension(stem: String, ext: &str) -> String {
    if ext.is_empty() {
        stem
    } else {
        format!("{stem}.{ext}")
    }
}

/// Directory the toolchain writes outputs to for one triple and mode.
pub fn output_dir(target_dir: &Path, triple: TargetTriple, mode: BuildMode) -> PathBuf {
    target_dir.join(triple.to_string()).join(mode.as_str())
}

/// Path where the toolchain leaves the raw artifact.
pub fn raw_artifact_path(
    target_dir: &Path,
    triple: TargetTriple,
    mode: BuildMode,
    kind: ArtifactKind,
    app: &str,
) -> PathBuf {
    output_dir(target_dir, triple, mode).join(kind.file_name(app, triple.os()))
}

/// Uncompressed distribution name: `<app>-<platform>[.<ext>]`.
pub fn distribution_name(app: &str, platform: PlatformName, kind: ArtifactKind) -> String {
    with_extension(
        format!("{app}-{platform}"),
        kind.extension(platform.triple().os()),
    )
}

/// Compressed distribution name: `<app>-<platform>[.<ext>].gz`.
pub fn packaged_file_name(app: &str, platform: PlatformName, kind: ArtifactKind) -> String {
    format!("{}{COMPRESSED_SUFFIX}", distribution_name(app, platform, kind))
}

/// Checksum sidecar name for a packaged file name.
pub fn checksum_file_name(packaged: &str) -> String {
    format!("{packaged}{CHECKSUM_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::platform_name;

    #[test]
    fn file_names_per_os() {
        assert_eq!(ArtifactKind::DynamicLib.file_name("pact_ffi", OsFamily::Linux), "libpact_ffi.so");
        assert_eq!(ArtifactKind::DynamicLib.file_name("pact_ffi", OsFamily::MacOs), "libpact_ffi.dylib");
        assert_eq!(ArtifactKind::DynamicLib.file_name("pact_ffi", OsFamily::Windows), "pact_ffi.dll");
        assert_eq!(ArtifactKind::StaticLib.file_name("pact_ffi", OsFamily::Linux), "libpact_ffi.a");
        assert_eq!(ArtifactKind::StaticLib.file_name("pact_ffi", OsFamily::Windows), "pact_ffi.lib");
        assert_eq!(ArtifactKind::Executable.file_name("verifier", OsFamily::Linux), "verifier");
        assert_eq!(ArtifactKind::Executable.file_name("verifier", OsFamily::Windows), "verifier.exe");
        assert_eq!(ArtifactKind::Header.file_name("pact", OsFamily::MacOs), "pact.h");
    }

    #[test]
    fn raw_path_layout() {
        let path = raw_artifact_path(
            Path::new("target"),
            TargetTriple::AARCH64_LINUX_MUSL,
            BuildMode::Release,
            ArtifactKind::DynamicLib,
            "pact_ffi",
        );
        assert_eq!(
            path,
            Path::new("target/aarch64-unknown-linux-musl/release/libpact_ffi.so")
        );
    }

    #[test]
    fn packaged_names() {
        let linux = platform_name(TargetTriple::X86_64_LINUX_MUSL);
        assert_eq!(
            packaged_file_name("libpact_ffi", linux, ArtifactKind::DynamicLib),
            "libpact_ffi-linux-x86_64-musl.so.gz"
        );
        assert_eq!(
            packaged_file_name("verifier", linux, ArtifactKind::Executable),
            "verifier-linux-x86_64-musl.gz"
        );
        let win = platform_name(TargetTriple::X86_64_WINDOWS);
        assert_eq!(
            packaged_file_name("verifier", win, ArtifactKind::Executable),
            "verifier-windows-x86_64.exe.gz"
        );
        assert_eq!(
            checksum_file_name("verifier-windows-x86_64.exe.gz"),
            "verifier-windows-x86_64.exe.gz.sha256"
        );
    }

    #[test]
    fn packaged_names_never_collide() {
        let kinds = [
            ArtifactKind::StaticLib,
            ArtifactKind::DynamicLib,
            ArtifactKind::Header,
            ArtifactKind::Executable,
        ];
        let mut seen = std::collections::HashSet::new();
        for triple in TargetTriple::ALL {
            for kind in kinds {
                let name = packaged_file_name("app", platform_name(triple), kind);
                assert!(seen.insert(name.clone()), "collision on {name}");
            }
        }
    }

    #[test]
    fn kind_parsing_accepts_cargo_aliases() {
        assert_eq!("cdylib".parse::<ArtifactKind>().unwrap(), ArtifactKind::DynamicLib);
        assert_eq!("static_lib".parse::<ArtifactKind>().unwrap(), ArtifactKind::StaticLib);
        assert!("wasm".parse::<ArtifactKind>().is_err());
    }
}
