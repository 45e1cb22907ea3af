//! `binmatrix build`: plan, build and package across the matrix.

use anyhow::{Context, Result};
use binmatrix_build::{
    BuildError, BuildPlan, BuildReport, Orchestrator, ProcessRunner, ToolchainRunner,
};
use binmatrix_targets::{platform_name, BuildMode, OsFamily};
use serde_json::json;

use crate::manifest::Project;

pub struct BuildOptions {
    pub target: Option<String>,
    pub release: bool,
    pub dry_run: bool,
    pub json: bool,
    pub extra_flags: Vec<String>,
}

pub fn run(project: &Project, options: &BuildOptions) -> Result<()> {
    run_with(project, options, ProcessRunner)
}

/// Build an orchestrator for the project on the current host.
pub(crate) fn orchestrator<R: ToolchainRunner>(project: &Project, runner: R) -> Result<Orchestrator<R>> {
    let host_os = OsFamily::current().ok_or_else(|| BuildError::UnsupportedHost {
        os: std::env::consts::OS.to_string(),
    })?;
    let mut orchestrator = Orchestrator::new(
        project.manifest.matrix()?,
        host_os,
        project.layout(),
        project.packager(),
        runner,
    )?;
    if let Some(emitter) = project.header_emitter() {
        orchestrator = orchestrator.with_header(emitter);
    }
    Ok(orchestrator)
}

pub(crate) fn run_with<R: ToolchainRunner>(project: &Project, options: &BuildOptions, runner: R) -> Result<()> {
    let mut orchestrator = orchestrator(project, runner)?;
    let selection = orchestrator.select(options.target.as_deref())?;
    let mode = BuildMode::from_release_flag(options.release);
    let plan = orchestrator.plan(selection, mode, &options.extra_flags)?;

    if options.dry_run {
        if options.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print!("{}", render_plan(&plan, project));
        }
        return Ok(());
    }

    let report = orchestrator.execute(&plan);
    if options.json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        print!("{report}");
    }
    report.into_result().context("build aborted")?;
    Ok(())
}

fn render_plan(plan: &BuildPlan, project: &Project) -> String {
    let mut out = format!("=== Build Plan ({}) ===\n\n--- Steps ---\n", plan.mode);
    for (i, step) in plan.steps.iter().enumerate() {
        out.push_str(&format!(
            "  {:>2}. {:<28} {:<20} {}\n",
            i + 1,
            step.config.triple.to_string(),
            platform_name(step.config.triple).as_str(),
            step.config.toolchain
        ));
        out.push_str(&format!("      {}\n", step.invocation));
        if step.emit_header {
            out.push_str("      + binding header\n");
        }
    }
    if !plan.skipped.is_empty() {
        out.push_str("\n--- Skipped ---\n");
        for skip in &plan.skipped {
            out.push_str(&format!("  {:<28} {}\n", skip.triple.to_string(), skip.reason));
        }
    }
    if plan.isolate && plan.steps.len() > 1 {
        out.push_str(&format!(
            "\n{} is cleared between triples.\n",
            project.target_dir().display()
        ));
    }
    out.push_str(&format!("Artifacts: {}\n", project.artifacts_dir().display()));
    out
}

fn report_json(report: &BuildReport) -> serde_json::Value {
    let targets: Vec<_> = report
        .targets
        .iter()
        .map(|t| {
            json!({
                "triple": t.triple,
                "platform": t.platform.as_str(),
                "state": t.state(),
                "failure": t.failure,
                "duration_ms": t.duration.as_millis() as u64,
                "artifacts": t.artifacts.iter().map(|a| json!({
                    "kind": a.kind,
                    "path": a.compressed_path.display().to_string(),
                    "sha256": a.checksum.as_str(),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();
    json!({
        "mode": report.mode,
        "succeeded": report.succeeded(),
        "targets": targets,
        "skipped": report.skipped,
        "error": report.error.as_ref().map(|e| e.to_string()),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::manifest::BinmatrixManifest;
    use binmatrix_build::{Invocation, Selection};
    use binmatrix_targets::artifact::raw_artifact_path;
    use binmatrix_targets::{ArtifactKind, TargetTriple};
    use std::io;
    use std::path::{Path, PathBuf};

    /// Pretends every build succeeds by writing the expected raw outputs.
    pub(crate) struct FakeCargo {
        pub app: String,
        pub kinds: Vec<ArtifactKind>,
        pub fail_on: Option<TargetTriple>,
    }

    impl FakeCargo {
        pub fn new(app: &str, kinds: &[ArtifactKind]) -> Self {
            FakeCargo {
                app: app.to_string(),
                kinds: kinds.to_vec(),
                fail_on: None,
            }
        }
    }

    fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    impl ToolchainRunner for FakeCargo {
        fn run(&mut self, inv: &Invocation) -> io::Result<i32> {
            if inv.args.first().map(String::as_str) != Some("build") {
                return Ok(0);
            }
            let triple: TargetTriple = flag(&inv.args, "--target").unwrap().parse().unwrap();
            if self.fail_on == Some(triple) {
                return Ok(101);
            }
            let target_dir = PathBuf::from(flag(&inv.args, "--target-dir").unwrap());
            let mode = BuildMode::from_release_flag(inv.args.iter().any(|a| a == "--release"));
            for kind in &self.kinds {
                let raw = raw_artifact_path(&target_dir, triple, mode, *kind, &self.app);
                std::fs::create_dir_all(raw.parent().unwrap())?;
                std::fs::write(&raw, format!("{triple} {kind}"))?;
            }
            Ok(0)
        }

        fn capture(&mut self, _inv: &Invocation) -> io::Result<(i32, String)> {
            let installed: Vec<String> = TargetTriple::ALL.iter().map(|t| t.to_string()).collect();
            Ok((0, installed.join("\n")))
        }
    }

    pub(crate) fn project_in(dir: &Path, toml: &str) -> Project {
        Project::new(toml::from_str::<BinmatrixManifest>(toml).unwrap(), dir.to_path_buf())
    }

    fn options(target: Option<&str>) -> BuildOptions {
        BuildOptions {
            target: target.map(str::to_string),
            release: true,
            dry_run: false,
            json: false,
            extra_flags: Vec::new(),
        }
    }

    #[test]
    fn single_triple_build_packages_into_artifacts_dir() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"pact_ffi\"\nkinds = [\"dynamic_lib\"]\n");
        let runner = FakeCargo::new("pact_ffi", &[ArtifactKind::DynamicLib]);

        run_with(&project, &options(Some("x86_64-unknown-linux-gnu")), runner).unwrap();

        let packaged = project.artifacts_dir().join("pact_ffi-linux-x86_64.so.gz");
        assert!(packaged.is_file());
        assert!(project.artifacts_dir().join("pact_ffi-linux-x86_64.so.gz.sha256").is_file());
    }

    #[test]
    fn failing_triple_fails_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"pact_ffi\"\nkinds = [\"static_lib\"]\n");
        let mut runner = FakeCargo::new("pact_ffi", &[ArtifactKind::StaticLib]);
        runner.fail_on = Some(TargetTriple::AARCH64_LINUX_GNU);

        let err = run_with(&project, &options(None), runner).unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("aarch64-unknown-linux-gnu"), "{text}");
        assert!(project.artifacts_dir().join("pact_ffi-linux-x86_64.a.gz").is_file());
        assert!(!project.artifacts_dir().join("pact_ffi-linux-x86_64-musl.a.gz").exists());
    }

    #[test]
    fn dry_run_builds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"pact_ffi\"\n");
        let mut opts = options(None);
        opts.dry_run = true;

        run_with(&project, &opts, FakeCargo::new("pact_ffi", &[])).unwrap();
        assert!(!project.artifacts_dir().exists());
    }

    #[test]
    fn plan_rendering_lists_matrix_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(
            dir.path(),
            "[project]\nname = \"pact_ffi\"\n[build]\nemit_header = true\n",
        );
        let orch = orchestrator(&project, FakeCargo::new("pact_ffi", &[])).unwrap();
        let plan = orch.plan(Selection::All, BuildMode::Release, &[]).unwrap();
        let text = render_plan(&plan, &project);

        let first = text.find("x86_64-unknown-linux-gnu").unwrap();
        let last = text.find("aarch64-pc-windows-msvc").unwrap();
        assert!(first < last);
        assert_eq!(text.matches("+ binding header").count(), 1);
        assert!(text.contains("is cleared between triples"));
    }

    #[test]
    fn musl_only_policy_rejects_gnu_executable() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(
            dir.path(),
            "[project]\nname = \"pact\"\nkinds = [\"executable\"]\n[policy]\nlinux_gnu = \"musl-only\"\n",
        );
        let err = run_with(
            &project,
            &options(Some("aarch64-unknown-linux-gnu")),
            FakeCargo::new("pact", &[ArtifactKind::Executable]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("aarch64-unknown-linux-musl"));
    }

    #[test]
    fn musl_only_executable_with_header_needs_musl_primary() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = "[project]\nname = \"pact\"\nkinds = [\"executable\"]\n\
                        [build]\nemit_header = true\n[policy]\nlinux_gnu = \"musl-only\"\n";
        let project = project_in(dir.path(), manifest);
        let err = run_with(&project, &options(None), FakeCargo::new("pact", &[ArtifactKind::Executable]))
            .unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("header generation needs primary x86_64-unknown-linux-gnu"), "{text}");
        assert!(!project.artifacts_dir().exists());
    }

    #[test]
    fn unknown_target_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"pact_ffi\"\n");
        let err = run_with(&project, &options(Some("mips-unknown-linux-gnu")), FakeCargo::new("pact_ffi", &[]))
            .unwrap_err();
        assert!(err.to_string().contains("unknown target triple"));
    }
}
