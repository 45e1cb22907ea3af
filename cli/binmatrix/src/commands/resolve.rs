//! `binmatrix resolve`: print where the artifact for a host lives.

use std::path::PathBuf;

use anyhow::Result;
use binmatrix_resolve::{HostDescriptor, Resolution, Resolver, ResolverEnv};
use binmatrix_targets::{ArtifactKind, BuildMode};

use crate::manifest::Project;

pub fn run(project: &Project, descriptor: Option<&str>, kind: &str, release: bool, check: bool) -> Result<()> {
    let descriptor = descriptor.map_or_else(HostDescriptor::current, HostDescriptor::new);
    let kind: ArtifactKind = kind.parse()?;
    let mode = BuildMode::from_release_flag(release);
    let path = resolve(project, &descriptor, kind, mode, check, ResolverEnv::from_process())?;
    println!("{}", path.display());
    Ok(())
}

/// Classify `descriptor` once and return its artifact path. With `check`,
/// the file must also exist.
fn resolve(
    project: &Project,
    descriptor: &HostDescriptor,
    kind: ArtifactKind,
    mode: BuildMode,
    check: bool,
    env: ResolverEnv,
) -> Result<PathBuf> {
    let resolver = Resolver::new(project.resolver_config(mode, kind), env);
    let resolution = resolver.resolve(descriptor)?;
    if let Resolution::Resolved { platform, .. } = &resolution {
        log::info!("{descriptor} -> {platform} ({})", resolver.packaged_file_name(*platform));
    }
    if check {
        return Ok(resolution.existing()?);
    }
    Ok(resolution.into_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build::tests::project_in;
    use std::fs;

    const MANIFEST: &str = "[project]\nname = \"pact_ffi\"\n[resolve]\nbase_dir = \"vendor/pact\"\n";

    fn host(raw: &str) -> HostDescriptor {
        HostDescriptor::new(raw)
    }

    #[test]
    fn resolves_from_project_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), MANIFEST);
        let path = resolve(
            &project,
            &host("arm64-apple-darwin22"),
            ArtifactKind::DynamicLib,
            BuildMode::Release,
            false,
            ResolverEnv::default(),
        )
        .unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("vendor/pact")
                .join("aarch64-apple-darwin/release/libpact_ffi.dylib")
        );
    }

    #[test]
    fn unsupported_descriptor_fails() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), MANIFEST);
        let err = resolve(
            &project,
            &host("aarch64-linux-android"),
            ArtifactKind::DynamicLib,
            BuildMode::Debug,
            false,
            ResolverEnv::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("aarch64-linux-android"));
    }

    #[test]
    fn check_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), MANIFEST);
        let linux = host("x86_64-unknown-linux-gnu");
        let err = resolve(&project, &linux, ArtifactKind::StaticLib, BuildMode::Debug, true, ResolverEnv::default())
            .unwrap_err();
        assert!(err.to_string().contains("linux-x86_64"));

        let expected = dir.path().join("vendor/pact/x86_64-unknown-linux-gnu/debug/libpact_ffi.a");
        fs::create_dir_all(expected.parent().unwrap()).unwrap();
        fs::write(&expected, b"archive").unwrap();
        let found = resolve(&project, &linux, ArtifactKind::StaticLib, BuildMode::Debug, true, ResolverEnv::default())
            .unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn override_skips_classification() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), MANIFEST);
        let env = ResolverEnv {
            override_path: Some(PathBuf::from("/opt/libpact_ffi.so")),
            debug: false,
        };
        let path = resolve(
            &project,
            &host("sparc64-unknown-unknown"),
            ArtifactKind::DynamicLib,
            BuildMode::Debug,
            false,
            env,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/opt/libpact_ffi.so"));
    }
}
