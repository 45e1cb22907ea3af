//! `binmatrix install`: verify a packaged artifact and unpack it where the
//! resolver will look for it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use binmatrix_package::unpack;
use binmatrix_resolve::{HostDescriptor, HostSignature, Resolver, ResolverEnv};
use binmatrix_targets::{platform_name, ArtifactKind, BuildMode, TargetTriple};

use crate::manifest::Project;

pub fn run(project: &Project, target: &str, kind: &str, release: bool) -> Result<()> {
    let triple: TargetTriple = target.parse()?;
    let kind: ArtifactKind = kind.parse()?;
    let dest = install(project, triple, kind, BuildMode::from_release_flag(release))?;
    println!("Installed {}", dest.display());
    Ok(())
}

pub(crate) fn install(project: &Project, triple: TargetTriple, kind: ArtifactKind, mode: BuildMode) -> Result<PathBuf> {
    let platform = platform_name(triple);
    let packaged = project.packager().compressed_path(platform, kind);
    if !packaged.is_file() {
        bail!(
            "{} not found; run 'binmatrix build --target {triple}' first",
            packaged.display()
        );
    }

    // The override only redirects lookups, never where files are installed.
    let signature = HostSignature::classify(&HostDescriptor::new(triple.to_string()))?;
    let resolver = Resolver::new(project.resolver_config(mode, kind), ResolverEnv::default());
    let dest = resolver.resolve_signature(signature).into_path();

    unpack(&packaged, &dest).with_context(|| format!("installing {}", packaged.display()))
}
