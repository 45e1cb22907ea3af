//! `binmatrix package`: compress one raw artifact and write its checksum.

use std::path::Path;

use anyhow::{Context, Result};
use binmatrix_package::Artifact;
use binmatrix_targets::artifact::raw_artifact_path;
use binmatrix_targets::{platform_name, ArtifactKind, BuildMode, TargetTriple};

use crate::manifest::Project;

pub fn run(project: &Project, target: &str, kind: &str, raw: Option<&Path>, release: bool) -> Result<()> {
    let triple: TargetTriple = target.parse()?;
    let kind: ArtifactKind = kind.parse()?;
    let artifact = package_one(project, triple, kind, raw, BuildMode::from_release_flag(release))?;
    println!("{}  {}", artifact.checksum, artifact.compressed_path.display());
    Ok(())
}

pub(crate) fn package_one(
    project: &Project,
    triple: TargetTriple,
    kind: ArtifactKind,
    raw: Option<&Path>,
    mode: BuildMode,
) -> Result<Artifact> {
    let raw = match raw {
        Some(path) => path.to_path_buf(),
        None => raw_artifact_path(&project.target_dir(), triple, mode, kind, project.app_name()),
    };
    project
        .packager()
        .package(&raw, platform_name(triple), kind)
        .with_context(|| format!("packaging {kind} for {triple}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build::tests::project_in;
    use std::fs;

    #[test]
    fn packages_default_raw_path() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"pact_ffi\"\n");
        let triple = TargetTriple::X86_64_WINDOWS;
        let raw = raw_artifact_path(
            &project.target_dir(),
            triple,
            BuildMode::Release,
            ArtifactKind::DynamicLib,
            "pact_ffi",
        );
        fs::create_dir_all(raw.parent().unwrap()).unwrap();
        fs::write(&raw, b"MZ").unwrap();

        let artifact = package_one(&project, triple, ArtifactKind::DynamicLib, None, BuildMode::Release).unwrap();
        assert_eq!(
            artifact.compressed_path,
            project.artifacts_dir().join("pact_ffi-windows-x86_64.dll.gz")
        );
        assert!(artifact.checksum_path.is_file());
    }

    #[test]
    fn explicit_raw_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"pact_ffi\"\n");
        let header = dir.path().join("include").join("pact.h");
        fs::create_dir_all(header.parent().unwrap()).unwrap();
        fs::write(&header, "int pact(void);\n").unwrap();

        let artifact = package_one(
            &project,
            TargetTriple::X86_64_LINUX_GNU,
            ArtifactKind::Header,
            Some(&header),
            BuildMode::Debug,
        )
        .unwrap();
        assert!(artifact.compressed_path.ends_with("pact_ffi-linux-x86_64.h.gz"));
    }

    #[test]
    fn missing_raw_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"pact_ffi\"\n");
        let err = package_one(
            &project,
            TargetTriple::AARCH64_MACOS,
            ArtifactKind::StaticLib,
            None,
            BuildMode::Debug,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("packaging static_lib for aarch64-apple-darwin"));
        assert!(!project.artifacts_dir().join("pact_ffi-macos-aarch64.a.gz").exists());
    }

    #[test]
    fn bad_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"pact_ffi\"\n");
        assert!(run(&project, "x86_64-apple-darwin", "wasm", None, false).is_err());
        assert!(run(&project, "x86_64-apple-darwn", "header", None, false).is_err());
    }
}
