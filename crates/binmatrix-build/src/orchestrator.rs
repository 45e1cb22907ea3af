//! Sequential, fail-fast build orchestration.
//!
//! plan -> for each triple: [clear shared output] -> toolchain check ->
//! build -> package -> [emit header once] -> next triple.
//!
//! The first failing triple aborts the batch. Triples after it stay
//! `Pending` in the report and are never attempted.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use binmatrix_package::{Artifact, Packager};
use binmatrix_targets::artifact::raw_artifact_path;
use binmatrix_targets::{
    platform_name, ArtifactKind, BuildConfiguration, BuildMode, Environment, OsFamily,
    TargetError, TargetMatrix, TargetTriple,
};
use serde::Serialize;

use crate::error::{BuildError, Result};
use crate::header::HeaderEmitter;
use crate::report::BuildReport;
use crate::state::TargetBuild;
use crate::toolchain::{
    build_invocation, driver, install_invocation, probe_invocation, probe_ready, Invocation,
    ToolchainRunner,
};

/// Which triples a build covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Every matrix triple, in matrix order.
    All,
    One(TargetTriple),
}

/// Where the project lives and what it produces.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub project_dir: PathBuf,
    /// Shared intermediate output root, cleared between triples in a batch.
    pub target_dir: PathBuf,
    /// Base name of produced files (`lib<app>.so`, `<app>.exe`, ...).
    pub app_name: String,
    /// Cargo package to build (`-p`), if the project is a workspace.
    pub cargo_package: Option<String>,
    pub kinds: Vec<ArtifactKind>,
}

/// One planned triple build.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub config: BuildConfiguration,
    pub invocation: Invocation,
    pub emit_header: bool,
}

/// A triple left out of the batch, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedTarget {
    pub triple: TargetTriple,
    pub reason: String,
}

/// The ordered steps of a batch, computed before anything runs.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub mode: BuildMode,
    pub steps: Vec<PlannedStep>,
    pub skipped: Vec<SkippedTarget>,
    /// Clear the shared output root before every step after the first.
    pub isolate: bool,
}

/// Drives builds across the target matrix.
pub struct Orchestrator<R> {
    matrix: TargetMatrix,
    host_os: OsFamily,
    layout: ProjectLayout,
    packager: Packager,
    header: Option<HeaderEmitter>,
    header_emitted: bool,
    runner: R,
}

impl<R: ToolchainRunner> Orchestrator<R> {
    /// Create an orchestrator. The artifacts directory must not live inside
    /// the target dir, since the target dir is wiped between triples.
    pub fn new(
        matrix: TargetMatrix,
        host_os: OsFamily,
        layout: ProjectLayout,
        packager: Packager,
        runner: R,
    ) -> Result<Self> {
        matrix.validate()?;
        if resolved(packager.artifacts_dir()).starts_with(resolved(&layout.target_dir)) {
            return Err(TargetError::Validation {
                detail: format!(
                    "artifacts dir {} is inside target dir {}",
                    packager.artifacts_dir().display(),
                    layout.target_dir.display()
                ),
            }
            .into());
        }
        Ok(Orchestrator {
            matrix,
            host_os,
            layout,
            packager,
            header: None,
            header_emitted: false,
            runner,
        })
    }

    pub fn with_header(mut self, emitter: HeaderEmitter) -> Self {
        self.header = Some(emitter);
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Turn a requested triple into a selection. `None` or an empty string
    /// selects the whole matrix; anything else must be a matrix entry.
    pub fn select(&self, triple: Option<&str>) -> Result<Selection> {
        match triple.map(str::trim) {
            None | Some("") => Ok(Selection::All),
            Some(t) => Ok(Selection::One(self.matrix.lookup(t)?.triple)),
        }
    }

    /// Resolve the selection into ordered steps without running anything.
    pub fn plan(&self, selection: Selection, mode: BuildMode, extra_flags: &[String]) -> Result<BuildPlan> {
        let mut triples = Vec::new();
        let mut skipped = Vec::new();

        let primary = self.matrix.primary();
        if self.header.is_some() && self.matrix.excluded_by_policy(primary, &self.layout.kinds) {
            return Err(BuildError::PrimaryExcluded {
                triple: primary.to_string(),
                alternative: musl_alternative(primary),
            });
        }

        match selection {
            Selection::One(triple) => {
                if self.matrix.entry(triple).is_none() {
                    return Err(BuildError::UnknownTriple {
                        triple: triple.to_string(),
                    });
                }
                if self.matrix.excluded_by_policy(triple, &self.layout.kinds) {
                    return Err(BuildError::PolicyExcluded {
                        triple: triple.to_string(),
                        alternative: musl_alternative(triple),
                    });
                }
                triples.push(triple);
            }
            Selection::All => {
                for entry in self.matrix.entries() {
                    if self.matrix.excluded_by_policy(entry.triple, &self.layout.kinds) {
                        log::warn!(
                            "skipping {}: musl-only policy, use {}",
                            entry.triple,
                            musl_alternative(entry.triple)
                        );
                        skipped.push(SkippedTarget {
                            triple: entry.triple,
                            reason: format!("musl-only policy; use {}", musl_alternative(entry.triple)),
                        });
                        continue;
                    }
                    triples.push(entry.triple);
                }
            }
        }

        let steps = triples
            .into_iter()
            .map(|triple| -> Result<PlannedStep> {
                let config = self.matrix.configure(triple, self.host_os, mode, extra_flags)?;
                let invocation = build_invocation(
                    &config,
                    &self.layout.project_dir,
                    &self.layout.target_dir,
                    self.layout.cargo_package.as_deref(),
                );
                Ok(PlannedStep {
                    emit_header: self.header.is_some() && triple == self.matrix.primary(),
                    config,
                    invocation,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BuildPlan {
            mode,
            isolate: selection == Selection::All,
            steps,
            skipped,
        })
    }

    /// Plan and run, turning a failed batch into an error.
    pub fn build(&mut self, selection: Selection, mode: BuildMode, extra_flags: &[String]) -> Result<BuildReport> {
        let plan = self.plan(selection, mode, extra_flags)?;
        self.execute(&plan).into_result()
    }

    /// Run a plan. Never panics on build failure: the report carries the
    /// first error and the state of every triple.
    pub fn execute(&mut self, plan: &BuildPlan) -> BuildReport {
        let batch_start = Instant::now();
        let mut report = BuildReport::new(plan.mode, plan.skipped.clone());

        for (index, step) in plan.steps.iter().enumerate() {
            let mut target = TargetBuild::new(step.config.triple);

            if report.error.is_some() {
                report.targets.push(target);
                continue;
            }

            if plan.isolate && index > 0 {
                if let Err(e) = self.clear_intermediate() {
                    report.error = Some(e);
                    report.targets.push(target);
                    continue;
                }
            }

            let started = Instant::now();
            let outcome = target.start().and_then(|()| self.run_step(step));
            let transition = match outcome {
                Ok(artifacts) => target.packaged(artifacts),
                Err(err) => {
                    log::error!("{}: {err}; aborting remaining targets", step.config.triple);
                    let reason = err.to_string();
                    report.error = Some(err);
                    target.fail(reason)
                }
            };
            if let Err(e) = transition {
                report.error.get_or_insert(e);
            }
            target.duration = started.elapsed();
            report.targets.push(target);
        }

        report.duration = batch_start.elapsed();
        report
    }

    fn run_step(&mut self, step: &PlannedStep) -> Result<Vec<Artifact>> {
        let config = &step.config;
        let triple = config.triple;
        self.ensure_toolchain(config)?;

        log::info!(
            "building {triple} ({} toolchain, {})",
            config.toolchain,
            config.build_mode
        );
        let status = self
            .runner
            .run(&step.invocation)
            .map_err(|source| BuildError::Spawn {
                program: step.invocation.program.clone(),
                source,
            })?;
        if status != 0 {
            return Err(BuildError::BuildFailure {
                triple: triple.to_string(),
                stage: "build".into(),
                status,
            });
        }

        let platform = platform_name(triple);
        let mut artifacts = Vec::new();
        for kind in self.layout.kinds.iter().copied().filter(|k| k.is_compiled()) {
            let raw = raw_artifact_path(
                &self.layout.target_dir,
                triple,
                config.build_mode,
                kind,
                &self.layout.app_name,
            );
            artifacts.push(self.packager.package(&raw, platform, kind)?);
        }

        if step.emit_header && !self.header_emitted {
            if let Some(emitter) = self.header.clone() {
                artifacts.push(self.emit_header(&emitter, config)?);
            }
        }

        Ok(artifacts)
    }

    /// Probe the toolchain; on failure run its install step once and probe
    /// again.
    fn ensure_toolchain(&mut self, config: &BuildConfiguration) -> Result<()> {
        let probe = probe_invocation(config);
        let ready = |runner: &mut R| match runner.capture(&probe) {
            Ok((status, stdout)) => probe_ready(config, status, &stdout),
            Err(e) => {
                log::debug!("probe '{probe}' failed: {e}");
                false
            }
        };

        if ready(&mut self.runner) {
            return Ok(());
        }

        let install = install_invocation(config);
        log::warn!(
            "{} toolchain not ready for {}; running '{install}'",
            config.toolchain,
            config.triple
        );
        let installed = matches!(self.runner.run(&install), Ok(0));
        if installed && ready(&mut self.runner) {
            return Ok(());
        }

        Err(BuildError::ToolchainMissing {
            toolchain: driver(config.toolchain).to_string(),
            triple: config.triple.to_string(),
            detail: format!("'{install}' did not make it available"),
        })
    }

    fn emit_header(&mut self, emitter: &HeaderEmitter, config: &BuildConfiguration) -> Result<Artifact> {
        let probe = emitter.probe_invocation();
        let ready = |runner: &mut R| matches!(runner.capture(&probe), Ok((0, _)));
        if !ready(&mut self.runner) {
            let install = emitter.install_invocation();
            log::warn!("{} not found; running '{install}'", emitter.tool);
            let installed = matches!(self.runner.run(&install), Ok(0));
            if !(installed && ready(&mut self.runner)) {
                return Err(BuildError::ToolchainMissing {
                    toolchain: emitter.tool.clone(),
                    triple: config.triple.to_string(),
                    detail: format!("'{install}' did not make it available"),
                });
            }
        }

        let output = raw_artifact_path(
            &self.layout.target_dir,
            config.triple,
            config.build_mode,
            ArtifactKind::Header,
            &self.layout.app_name,
        );
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }

        log::info!("generating header for {} with {}", config.triple, emitter.tool);
        let emit = emitter.emit_invocation(&self.layout.project_dir, &output);
        let status = self.runner.run(&emit).map_err(|source| BuildError::Spawn {
            program: emit.program.clone(),
            source,
        })?;
        if status != 0 {
            return Err(BuildError::BuildFailure {
                triple: config.triple.to_string(),
                stage: "header generation".into(),
                status,
            });
        }
        self.header_emitted = true;

        Ok(self
            .packager
            .package(&output, platform_name(config.triple), ArtifactKind::Header)?)
    }

    fn clear_intermediate(&self) -> Result<()> {
        let dir = &self.layout.target_dir;
        if dir.exists() {
            log::info!("clearing shared build output {}", dir.display());
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

/// `path` with symlinks and `..` resolved as far as it exists on disk; the
/// missing tail is appended as written.
fn resolved(path: &Path) -> PathBuf {
    let absolute = match std::env::current_dir() {
        Ok(cwd) if path.is_relative() => cwd.join(path),
        _ => path.to_path_buf(),
    };
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => {
                out.push(other);
                if let Ok(real) = out.canonicalize() {
                    out = real;
                }
            }
        }
    }
    out
}

/// The musl triple with the same CPU as `triple`.
fn musl_alternative(triple: TargetTriple) -> String {
    TargetTriple::from_parts(triple.cpu(), OsFamily::Linux, Environment::Musl)
        .map(|t| t.to_string())
        .unwrap_or_else(|| "a musl target".into())
}
