//! The target matrix and per-triple build configuration.
//!
//! The matrix is an ordered list of entries, one per triple. Order is the
//! batch build order. Each entry carries the triple-specific flags and
//! environment that must only ever be applied to that triple.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactKind, BuildMode};
use crate::error::{Result, TargetError};
use crate::platform::platform_name;
use crate::triple::{CpuArch, Environment, OsFamily, TargetTriple};

/// Toolchain strategy for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toolchain {
    /// The host's own compiler driver (`cargo`).
    Native,
    /// A cross-compilation driver (`cross`).
    Cross,
}

impl Toolchain {
    /// Select the strategy for building `target` on a host of `host_os`.
    pub fn select(host_os: OsFamily, target: TargetTriple) -> Self {
        if host_os == target.os() {
            Toolchain::Native
        } else {
            Toolchain::Cross
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Toolchain::Native => "native",
            Toolchain::Cross => "cross",
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How glibc Linux targets are treated when an executable is distributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinuxGnuPolicy {
    /// Build gnu and musl variants alike.
    #[default]
    Allow,
    /// Executables ship musl-only; gnu triples are excluded.
    MuslOnly,
}

/// One row of the target matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub triple: TargetTriple,
    /// Extra flags passed to the compiler driver, in order.
    pub extra_flags: Vec<String>,
    /// Environment set only for this triple's toolchain invocation.
    pub env: BTreeMap<String, String>,
}

impl TargetEntry {
    pub fn new(triple: TargetTriple) -> Self {
        TargetEntry {
            triple,
            extra_flags: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }
}

/// Per-triple overrides from project configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOverride {
    #[serde(default)]
    pub extra_flags: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// The ordered, validated set of supported targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMatrix {
    entries: Vec<TargetEntry>,
    primary: TargetTriple,
    linux_gnu: LinuxGnuPolicy,
}

impl TargetMatrix {
    /// The built-in matrix with its special-case flags.
    pub fn builtin() -> Self {
        let entries = TargetTriple::ALL
            .into_iter()
            .map(|triple| {
                let entry = TargetEntry::new(triple);
                match (triple.os(), triple.env()) {
                    // cdylibs on musl must link libc dynamically; aarch64 also
                    // needs libresolv for the resolver symbols.
                    (OsFamily::Linux, Environment::Musl) if triple.cpu() == CpuArch::Aarch64 => {
                        entry.with_env("RUSTFLAGS", "-C target-feature=-crt-static -C link-arg=-lresolv")
                    }
                    (OsFamily::Linux, Environment::Musl) => {
                        entry.with_env("RUSTFLAGS", "-C target-feature=-crt-static")
                    }
                    (OsFamily::MacOs, _) => entry.with_env("MACOSX_DEPLOYMENT_TARGET", "12"),
                    _ => entry,
                }
            })
            .collect();

        TargetMatrix {
            entries,
            primary: TargetTriple::X86_64_LINUX_GNU,
            linux_gnu: LinuxGnuPolicy::Allow,
        }
    }

    /// Build a matrix from explicit entries. Validates before returning.
    pub fn from_entries(entries: Vec<TargetEntry>, primary: TargetTriple) -> Result<Self> {
        let matrix = TargetMatrix {
            entries,
            primary,
            linux_gnu: LinuxGnuPolicy::Allow,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Check uniqueness of triples and canonical names, and that the primary
    /// triple is part of the matrix.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(TargetError::Validation {
                detail: "target matrix is empty".into(),
            });
        }
        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                if a.triple == b.triple {
                    return Err(TargetError::DuplicateTriple {
                        triple: a.triple.to_string(),
                    });
                }
                let (name_a, name_b) = (platform_name(a.triple), platform_name(b.triple));
                if name_a.as_str() == name_b.as_str() {
                    return Err(TargetError::NameCollision {
                        name: name_a.to_string(),
                        first: a.triple.to_string(),
                        second: b.triple.to_string(),
                    });
                }
            }
        }
        if self.entry(self.primary).is_none() {
            return Err(TargetError::Validation {
                detail: format!("primary triple {} is not in the matrix", self.primary),
            });
        }
        Ok(())
    }

    pub fn entries(&self) -> &[TargetEntry] {
        &self.entries
    }

    pub fn entry(&self, triple: TargetTriple) -> Option<&TargetEntry> {
        self.entries.iter().find(|e| e.triple == triple)
    }

    /// Look up an entry by triple string, rejecting anything outside the matrix.
    pub fn lookup(&self, triple: &str) -> Result<&TargetEntry> {
        let parsed: TargetTriple = triple.parse()?;
        self.entry(parsed).ok_or_else(|| TargetError::UnknownTriple {
            triple: triple.to_string(),
        })
    }

    /// The triple the header emitter is tied to.
    pub fn primary(&self) -> TargetTriple {
        self.primary
    }

    pub fn set_primary(&mut self, triple: TargetTriple) -> Result<()> {
        if self.entry(triple).is_none() {
            return Err(TargetError::UnknownTriple {
                triple: triple.to_string(),
            });
        }
        self.primary = triple;
        Ok(())
    }

    pub fn linux_gnu_policy(&self) -> LinuxGnuPolicy {
        self.linux_gnu
    }

    pub fn set_linux_gnu_policy(&mut self, policy: LinuxGnuPolicy) {
        self.linux_gnu = policy;
    }

    /// Merge a project override into one entry. Flags are appended after the
    /// built-in ones; env keys replace built-in values.
    pub fn apply_override(&mut self, triple: TargetTriple, ov: &TargetOverride) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.triple == triple)
            .ok_or_else(|| TargetError::UnknownTriple {
                triple: triple.to_string(),
            })?;
        entry.extra_flags.extend(ov.extra_flags.iter().cloned());
        for (k, v) in &ov.env {
            entry.env.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    /// Whether the distribution policy excludes `triple` when `kinds` are built.
    pub fn excluded_by_policy(&self, triple: TargetTriple, kinds: &[ArtifactKind]) -> bool {
        self.linux_gnu == LinuxGnuPolicy::MuslOnly
            && triple.is_linux_gnu()
            && kinds.contains(&ArtifactKind::Executable)
    }

    /// Derive the build configuration for one triple.
    pub fn configure(
        &self,
        triple: TargetTriple,
        host_os: OsFamily,
        mode: BuildMode,
        extra_flags: &[String],
    ) -> Result<BuildConfiguration> {
        let entry = self.entry(triple).ok_or_else(|| TargetError::UnknownTriple {
            triple: triple.to_string(),
        })?;
        let mut flags = entry.extra_flags.clone();
        flags.extend(extra_flags.iter().cloned());
        Ok(BuildConfiguration {
            triple,
            toolchain: Toolchain::select(host_os, triple),
            build_mode: mode,
            extra_flags: flags,
            env_overrides: entry.env.clone(),
        })
    }
}

/// Everything needed to invoke the toolchain for one triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    pub triple: TargetTriple,
    pub toolchain: Toolchain,
    pub build_mode: BuildMode,
    pub extra_flags: Vec<String>,
    pub env_overrides: BTreeMap<String, String>,
}
