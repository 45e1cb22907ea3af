//! Artifact path resolution for a classified host.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use binmatrix_targets::artifact::{packaged_file_name, raw_artifact_path};
use binmatrix_targets::{ArtifactKind, BuildMode, PlatformName};
use log::Level;

use crate::error::{ResolveError, Result};
use crate::host::{HostDescriptor, HostSignature};

/// Environment variable holding an explicit artifact path.
pub const OVERRIDE_ENV: &str = "BINMATRIX_LIB_PATH";

/// Environment variable that raises resolution logging to `info`.
pub const DEBUG_ENV: &str = "BINMATRIX_DEBUG_FFI";

/// Snapshot of the resolver's environment inputs, read once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverEnv {
    pub override_path: Option<PathBuf>,
    pub debug: bool,
}

impl ResolverEnv {
    /// Read both variables from the process environment.
    pub fn from_process() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Read both variables through `lookup`. An empty override counts as
    /// unset; debug is on for any value other than empty or `0`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let override_path = lookup(OVERRIDE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let debug = lookup(DEBUG_ENV).is_some_and(|v| !v.is_empty() && v != "0");
        ResolverEnv { override_path, debug }
    }
}

/// Where and what to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Root of the per-triple layout, normally the build target dir.
    pub base_dir: PathBuf,
    pub app_name: String,
    pub build_mode: BuildMode,
    pub kind: ArtifactKind,
}

impl ResolverConfig {
    pub fn new(base_dir: impl Into<PathBuf>, app_name: impl Into<String>) -> Self {
        ResolverConfig {
            base_dir: base_dir.into(),
            app_name: app_name.into(),
            build_mode: BuildMode::default(),
            kind: ArtifactKind::DynamicLib,
        }
    }
}

/// Result of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The override variable was set; classification never ran.
    Override(PathBuf),
    Resolved {
        signature: HostSignature,
        platform: PlatformName,
        path: PathBuf,
    },
}

impl Resolution {
    pub fn path(&self) -> &Path {
        match self {
            Resolution::Override(path) => path,
            Resolution::Resolved { path, .. } => path,
        }
    }

    pub fn platform(&self) -> Option<PlatformName> {
        match self {
            Resolution::Override(_) => None,
            Resolution::Resolved { platform, .. } => Some(*platform),
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Resolution::Override(path) => path,
            Resolution::Resolved { path, .. } => path,
        }
    }

    /// The path, provided a file exists there.
    pub fn existing(self) -> Result<PathBuf> {
        if self.path().is_file() {
            return Ok(self.into_path());
        }
        Err(ResolveError::ArtifactMissing {
            platform: self
                .platform()
                .map_or_else(|| OVERRIDE_ENV.to_string(), |p| p.to_string()),
            path: self.into_path(),
        })
    }
}

pub struct Resolver {
    config: ResolverConfig,
    env: ResolverEnv,
}

impl Resolver {
    pub fn new(config: ResolverConfig, env: ResolverEnv) -> Self {
        Resolver { config, env }
    }

    fn level(&self) -> Level {
        if self.env.debug {
            Level::Info
        } else {
            Level::Debug
        }
    }

    /// Resolve the artifact path for `descriptor`. The override, when set, is
    /// returned verbatim without looking at the descriptor.
    pub fn resolve(&self, descriptor: &HostDescriptor) -> Result<Resolution> {
        let level = self.level();
        if let Some(path) = &self.env.override_path {
            log::log!(level, "{OVERRIDE_ENV} set, using {}", path.display());
            return Ok(Resolution::Override(path.clone()));
        }

        log::log!(level, "resolving artifact for host '{descriptor}'");
        let signature = match HostSignature::classify(descriptor) {
            Ok(signature) => signature,
            Err(e) => {
                log::log!(level, "{e}");
                return Err(e);
            }
        };
        Ok(self.resolve_signature(signature))
    }

    /// Resolve for an already classified host.
    pub fn resolve_signature(&self, signature: HostSignature) -> Resolution {
        let triple = signature.triple();
        let platform = signature.platform();
        let path = raw_artifact_path(
            &self.config.base_dir,
            triple,
            self.config.build_mode,
            self.config.kind,
            &self.config.app_name,
        );
        log::log!(
            self.level(),
            "host '{}' -> {platform} ({triple}) -> {}",
            signature.raw_descriptor,
            path.display()
        );
        Resolution::Resolved {
            signature,
            platform,
            path,
        }
    }

    /// Name of the packaged file holding the artifact for `platform`.
    pub fn packaged_file_name(&self, platform: PlatformName) -> String {
        packaged_file_name(&self.config.app_name, platform, self.config.kind)
    }

    /// Resolve and require the file to exist.
    pub fn locate(&self, descriptor: &HostDescriptor) -> Result<PathBuf> {
        self.resolve(descriptor)?.existing()
    }
}
