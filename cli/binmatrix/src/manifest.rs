//! `binmatrix.toml` parsing and project configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use binmatrix_build::{HeaderEmitter, ProjectLayout};
use binmatrix_package::Packager;
use binmatrix_resolve::ResolverConfig;
use binmatrix_targets::{ArtifactKind, BuildMode, LinuxGnuPolicy, TargetMatrix, TargetOverride};
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "binmatrix.toml";

/// The top-level manifest structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinmatrixManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub policy: PolicySection,
    /// Per-triple overrides, keyed by triple string.
    #[serde(default)]
    pub targets: BTreeMap<String, TargetOverride>,
    #[serde(default)]
    pub resolve: ResolveSection,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// App name used in produced and packaged file names.
    pub name: String,
    /// Cargo package to build with `-p`, for workspaces.
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default = "default_kinds")]
    pub kinds: Vec<ArtifactKind>,
}

fn default_kinds() -> Vec<ArtifactKind> {
    vec![ArtifactKind::DynamicLib, ArtifactKind::StaticLib]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub target_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    /// Triple whose build also emits the binding header.
    pub primary: Option<String>,
    pub emit_header: bool,
    pub header_tool: String,
    /// Generator config file, relative to the project dir.
    pub header_config: Option<PathBuf>,
}

impl Default for BuildSection {
    fn default() -> Self {
        BuildSection {
            target_dir: PathBuf::from("target"),
            artifacts_dir: PathBuf::from("release_artifacts"),
            primary: None,
            emit_header: false,
            header_tool: "cbindgen".to_string(),
            header_config: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySection {
    pub linux_gnu: LinuxGnuPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveSection {
    /// Root of the installed layout. Defaults to the build target dir.
    pub base_dir: Option<PathBuf>,
}

impl BinmatrixManifest {
    /// Search upward from `start_dir` for `binmatrix.toml`, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: BinmatrixManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing binmatrix.toml")
    }

    /// The built-in matrix with this manifest's primary, policy and
    /// per-triple overrides applied.
    pub fn matrix(&self) -> Result<TargetMatrix> {
        let mut matrix = TargetMatrix::builtin();
        if let Some(primary) = &self.build.primary {
            let triple = primary
                .parse()
                .with_context(|| format!("[build] primary = \"{primary}\""))?;
            matrix.set_primary(triple)?;
        }
        matrix.set_linux_gnu_policy(self.policy.linux_gnu);
        for (name, ov) in &self.targets {
            let triple = name
                .parse()
                .with_context(|| format!("[targets.{name}]"))?;
            matrix.apply_override(triple, ov)?;
        }
        matrix.validate()?;
        Ok(matrix)
    }

    /// Generate the default manifest for `binmatrix init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"
kinds = ["dynamic_lib", "static_lib"]

[build]
target_dir = "target"
artifacts_dir = "release_artifacts"
primary = "x86_64-unknown-linux-gnu"
emit_header = true
header_tool = "cbindgen"

[policy]
linux_gnu = "allow"
"#
        )
    }
}

/// A loaded manifest plus the directory relative paths resolve against.
#[derive(Debug, Clone)]
pub struct Project {
    pub manifest: BinmatrixManifest,
    pub dir: PathBuf,
}

impl Project {
    pub fn new(manifest: BinmatrixManifest, dir: PathBuf) -> Self {
        Project { manifest, dir }
    }

    pub fn app_name(&self) -> &str {
        &self.manifest.project.name
    }

    pub fn target_dir(&self) -> PathBuf {
        self.dir.join(&self.manifest.build.target_dir)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.dir.join(&self.manifest.build.artifacts_dir)
    }

    pub fn resolve_base_dir(&self) -> PathBuf {
        match &self.manifest.resolve.base_dir {
            Some(base) => self.dir.join(base),
            None => self.target_dir(),
        }
    }

    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout {
            project_dir: self.dir.clone(),
            target_dir: self.target_dir(),
            app_name: self.app_name().to_string(),
            cargo_package: self.manifest.project.package.clone(),
            kinds: self.manifest.project.kinds.clone(),
        }
    }

    pub fn packager(&self) -> Packager {
        Packager::new(self.artifacts_dir(), self.app_name())
    }

    /// The header emitter, if header emission is enabled.
    pub fn header_emitter(&self) -> Option<HeaderEmitter> {
        let build = &self.manifest.build;
        if !build.emit_header {
            return None;
        }
        let crate_name = self
            .manifest
            .project
            .package
            .clone()
            .unwrap_or_else(|| self.app_name().to_string());
        Some(HeaderEmitter {
            tool: build.header_tool.clone(),
            crate_name,
            config_file: build.header_config.clone(),
        })
    }

    pub fn resolver_config(&self, mode: BuildMode, kind: ArtifactKind) -> ResolverConfig {
        ResolverConfig {
            base_dir: self.resolve_base_dir(),
            app_name: self.app_name().to_string(),
            build_mode: mode,
            kind,
        }
    }
}

/// Load the project the cwd belongs to, or fail with a hint.
pub fn load_project(cwd: &Path) -> Result<Project> {
    match BinmatrixManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok(Project::new(manifest, dir)),
        None => anyhow::bail!(
            "no {MANIFEST_FILE} found in {} or any parent directory (run 'binmatrix init <app>')",
            cwd.display()
        ),
    }
}
