//! Batch build report.

use std::fmt;
use std::time::Duration;

use binmatrix_package::Artifact;
use binmatrix_targets::BuildMode;

use crate::error::{BuildError, Result};
use crate::orchestrator::SkippedTarget;
use crate::state::{BuildState, TargetBuild};

/// Outcome of one batch: per-triple states plus the first error, if any.
#[derive(Debug)]
pub struct BuildReport {
    pub mode: BuildMode,
    /// Planned triples in build order, including ones never attempted.
    pub targets: Vec<TargetBuild>,
    pub skipped: Vec<SkippedTarget>,
    /// The error that halted the batch.
    pub error: Option<BuildError>,
    pub duration: Duration,
}

impl BuildReport {
    pub fn new(mode: BuildMode, skipped: Vec<SkippedTarget>) -> Self {
        BuildReport {
            mode,
            targets: Vec::new(),
            skipped,
            error: None,
            duration: Duration::ZERO,
        }
    }

    /// True when every planned triple reached `Packaged`.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
            && self
                .targets
                .iter()
                .all(|t| t.state() == BuildState::Packaged)
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.targets.iter().flat_map(|t| t.artifacts.iter())
    }

    /// Convert a failed batch into its halting error.
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Build Report ({}) ===", self.mode)?;
        writeln!(f, "Duration: {} ms", self.duration.as_millis())?;
        writeln!(f)?;

        writeln!(f, "--- Targets ---")?;
        for target in &self.targets {
            let status = match target.state() {
                BuildState::Pending => "not attempted".to_string(),
                BuildState::Building => "interrupted".to_string(),
                BuildState::Packaged => format!(
                    "packaged ({} artifacts, {} ms)",
                    target.artifacts.len(),
                    target.duration.as_millis()
                ),
                BuildState::Failed => format!(
                    "FAILED: {}",
                    target.failure.as_deref().unwrap_or("unknown error")
                ),
            };
            writeln!(
                f,
                "  {:<28} {:<20} {status}",
                target.triple.to_string(),
                target.platform.as_str()
            )?;
        }

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Skipped ---")?;
            for skip in &self.skipped {
                writeln!(f, "  {:<28} {}", skip.triple.to_string(), skip.reason)?;
            }
        }

        let artifacts: Vec<&Artifact> = self.artifacts().collect();
        if !artifacts.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Artifacts ---")?;
            for artifact in artifacts {
                writeln!(
                    f,
                    "  {}  {}",
                    artifact.checksum,
                    artifact.compressed_path.display()
                )?;
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Result: {}",
            if self.succeeded() { "OK" } else { "FAILED" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binmatrix_targets::TargetTriple;

    #[test]
    fn display_lists_every_state() {
        let mut ok = TargetBuild::new(TargetTriple::X86_64_LINUX_GNU);
        ok.start().unwrap();
        ok.packaged(Vec::new()).unwrap();
        let mut bad = TargetBuild::new(TargetTriple::AARCH64_LINUX_GNU);
        bad.start().unwrap();
        bad.fail("build failed for aarch64-unknown-linux-gnu (exit status 101)").unwrap();
        let pending = TargetBuild::new(TargetTriple::X86_64_LINUX_MUSL);

        let mut report = BuildReport::new(BuildMode::Release, Vec::new());
        report.targets = vec![ok, bad, pending];
        report.error = Some(BuildError::BuildFailure {
            triple: "aarch64-unknown-linux-gnu".into(),
            stage: "build".into(),
            status: 101,
        });

        let text = report.to_string();
        assert!(text.contains("=== Build Report (release) ==="));
        assert!(text.contains("linux-x86_64"));
        assert!(text.contains("FAILED: build failed"));
        assert!(text.contains("not attempted"));
        assert!(text.ends_with("Result: FAILED\n"));
    }

    #[test]
    fn empty_report_succeeds() {
        let report = BuildReport::new(BuildMode::Debug, Vec::new());
        assert!(report.succeeded());
        assert!(report.into_result().is_ok());
    }
}
