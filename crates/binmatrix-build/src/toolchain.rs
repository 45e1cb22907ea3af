//! Toolchain invocations and the runner seam.
//!
//! Every external process the orchestrator starts is described by an
//! [`Invocation`] first and handed to a [`ToolchainRunner`]. The real runner
//! spawns processes; tests substitute a scripted one.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use binmatrix_targets::{BuildConfiguration, BuildMode, Toolchain};
use serde::Serialize;

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn cwd(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Convert into a `std::process::Command`.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.env {
            write!(f, "{k}={v:?} ")?;
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Executes invocations. Exit statuses are plain integers; a process killed
/// by a signal reports `-1`.
pub trait ToolchainRunner {
    /// Run with inherited stdio and wait for completion.
    fn run(&mut self, invocation: &Invocation) -> io::Result<i32>;

    /// Run and capture stdout.
    fn capture(&mut self, invocation: &Invocation) -> io::Result<(i32, String)>;
}

/// Runs invocations as real child processes, one at a time.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ToolchainRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> io::Result<i32> {
        log::debug!("running: {invocation}");
        let status = invocation.command().status()?;
        Ok(status.code().unwrap_or(-1))
    }

    fn capture(&mut self, invocation: &Invocation) -> io::Result<(i32, String)> {
        log::debug!("probing: {invocation}");
        let output = invocation.command().stderr(Stdio::null()).output()?;
        Ok((
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).into_owned(),
        ))
    }
}

/// Compiler driver program for a toolchain strategy.
pub fn driver(toolchain: Toolchain) -> &'static str {
    match toolchain {
        Toolchain::Native => "cargo",
        Toolchain::Cross => "cross",
    }
}

/// The build command for one configuration.
pub fn build_invocation(
    config: &BuildConfiguration,
    project_dir: &Path,
    target_dir: &Path,
    package: Option<&str>,
) -> Invocation {
    let mut inv = Invocation::new(driver(config.toolchain))
        .arg("build")
        .args(["--target".to_string(), config.triple.to_string()])
        .args(["--target-dir".to_string(), target_dir.display().to_string()]);
    if config.build_mode == BuildMode::Release {
        inv = inv.arg("--release");
    }
    if let Some(pkg) = package {
        inv = inv.args(["-p", pkg]);
    }
    inv.args(config.extra_flags.iter().cloned())
        .env(&config.env_overrides)
        .cwd(project_dir)
}

/// Probe used to decide whether the toolchain is ready for a configuration.
pub fn probe_invocation(config: &BuildConfiguration) -> Invocation {
    match config.toolchain {
        Toolchain::Native => Invocation::new("rustup").args(["target", "list", "--installed"]),
        Toolchain::Cross => Invocation::new("cross").arg("--version"),
    }
}

/// Interpret a probe result.
pub fn probe_ready(config: &BuildConfiguration, status: i32, stdout: &str) -> bool {
    if status != 0 {
        return false;
    }
    match config.toolchain {
        Toolchain::Native => {
            let triple = config.triple.to_string();
            stdout.lines().any(|line| line.trim() == triple)
        }
        Toolchain::Cross => true,
    }
}

/// The one-shot install step tried when a probe fails.
pub fn install_invocation(config: &BuildConfiguration) -> Invocation {
    match config.toolchain {
        Toolchain::Native => Invocation::new("rustup")
            .args(["target", "add"])
            .arg(config.triple.to_string()),
        Toolchain::Cross => Invocation::new("cargo").args(["install", "cross", "--locked"]),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use binmatrix_targets::{OsFamily, TargetMatrix, TargetTriple};

    fn config(triple: TargetTriple, host: OsFamily, mode: BuildMode) -> BuildConfiguration {
        TargetMatrix::builtin()
            .configure(triple, host, mode, &["--locked".to_string()])
            .unwrap()
    }

    #[test]
    fn native_release_invocation() {
        let cfg = config(TargetTriple::AARCH64_LINUX_MUSL, OsFamily::Linux, BuildMode::Release);
        let inv = build_invocation(&cfg, Path::new("/src"), Path::new("/src/target"), Some("pact_ffi"));
        assert_eq!(inv.program, "cargo");
        assert_eq!(
            inv.args,
            vec![
                "build",
                "--target",
                "aarch64-unknown-linux-musl",
                "--target-dir",
                "/src/target",
                "--release",
                "-p",
                "pact_ffi",
                "--locked"
            ]
        );
        assert!(inv.env["RUSTFLAGS"].contains("-lresolv"));
        assert_eq!(inv.cwd.as_deref(), Some(Path::new("/src")));
    }

    #[test]
    fn cross_debug_invocation() {
        let cfg = config(TargetTriple::X86_64_WINDOWS, OsFamily::Linux, BuildMode::Debug);
        let inv = build_invocation(&cfg, Path::new("."), Path::new("target"), None);
        assert_eq!(inv.program, "cross");
        assert!(!inv.args.contains(&"--release".to_string()));
    }

    #[test]
    fn native_probe_requires_installed_target() {
        let cfg = config(TargetTriple::X86_64_LINUX_MUSL, OsFamily::Linux, BuildMode::Debug);
        assert!(probe_ready(&cfg, 0, "x86_64-unknown-linux-gnu\nx86_64-unknown-linux-musl\n"));
        assert!(!probe_ready(&cfg, 0, "x86_64-unknown-linux-gnu\n"));
        assert!(!probe_ready(&cfg, 1, "x86_64-unknown-linux-musl\n"));
    }

    #[test]
    fn install_steps() {
        let native = config(TargetTriple::X86_64_LINUX_MUSL, OsFamily::Linux, BuildMode::Debug);
        assert_eq!(
            install_invocation(&native).to_string(),
            "rustup target add x86_64-unknown-linux-musl"
        );
        let cross = config(TargetTriple::AARCH64_MACOS, OsFamily::Linux, BuildMode::Debug);
        assert_eq!(install_invocation(&cross).to_string(), "cargo install cross --locked");
    }

    #[test]
    fn display_includes_env() {
        let mut env = BTreeMap::new();
        env.insert("MACOSX_DEPLOYMENT_TARGET".to_string(), "12".to_string());
        let inv = Invocation::new("cargo").arg("build").env(&env);
        assert_eq!(inv.to_string(), "MACOSX_DEPLOYMENT_TARGET=\"12\" cargo build");
    }
}
