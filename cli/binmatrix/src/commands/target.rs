//! `binmatrix target`: matrix listing and description.

use anyhow::{bail, Result};
use binmatrix_targets::{
    platform_name, BuildMode, OsFamily, PlatformName, TargetMatrix, TargetTriple, Toolchain,
    PLATFORM_TABLE_VERSION,
};

use crate::manifest::Project;

/// The project's matrix, or the built-in one outside a project.
pub fn matrix_for(project: Option<&Project>) -> Result<TargetMatrix> {
    match project {
        Some(p) => p.manifest.matrix(),
        None => Ok(TargetMatrix::builtin()),
    }
}

pub fn list(matrix: &TargetMatrix) -> Result<()> {
    print!("{}", render_list(matrix, OsFamily::current()));
    Ok(())
}

pub fn describe(matrix: &TargetMatrix, name: &str, release: bool) -> Result<()> {
    let triple = lookup(name)?;
    let host = OsFamily::current().unwrap_or(OsFamily::Linux);
    let config = matrix.configure(triple, host, BuildMode::from_release_flag(release), &[])?;

    println!("=== Target: {triple} ===");
    println!("Platform:  {}", platform_name(triple));
    println!("CPU:       {}", triple.cpu().as_str());
    println!("OS:        {}", triple.os());
    println!("Toolchain: {} (from {host} host)", config.toolchain);
    println!("Mode:      {}", config.build_mode);
    if triple == matrix.primary() {
        println!("Primary:   yes (binding header is generated here)");
    }
    println!();
    println!("--- Environment ---");
    if config.env_overrides.is_empty() {
        println!("  (none)");
    }
    for (k, v) in &config.env_overrides {
        println!("  {k}={v}");
    }
    println!("--- Extra flags ---");
    if config.extra_flags.is_empty() {
        println!("  (none)");
    } else {
        println!("  {}", config.extra_flags.join(" "));
    }
    Ok(())
}

/// Accept either a triple or a canonical platform name.
fn lookup(name: &str) -> Result<TargetTriple> {
    if let Ok(triple) = name.parse::<TargetTriple>() {
        return Ok(triple);
    }
    match name.parse::<PlatformName>() {
        Ok(platform) => Ok(platform.triple()),
        Err(_) => bail!("unknown target: '{name}'. Use 'binmatrix target list' to see available targets."),
    }
}

fn render_list(matrix: &TargetMatrix, host: Option<OsFamily>) -> String {
    let mut out = format!("Target matrix (platform table v{PLATFORM_TABLE_VERSION}):\n\n");
    for entry in matrix.entries() {
        let toolchain = host.map_or("-", |h| Toolchain::select(h, entry.triple).as_str());
        let marker = if entry.triple == matrix.primary() { "*" } else { " " };
        out.push_str(&format!(
            "{marker} {:<28} {:<20} {toolchain}\n",
            entry.triple.to_string(),
            platform_name(entry.triple).as_str()
        ));
    }
    out.push_str("\n* primary triple. Use 'binmatrix target describe <name>' for details.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_includes_every_triple_in_order() {
        let text = render_list(&TargetMatrix::builtin(), Some(OsFamily::Linux));
        let mut last = 0;
        for triple in TargetTriple::ALL {
            let at = text.find(&triple.to_string()).unwrap();
            assert!(at >= last);
            last = at;
        }
        assert!(text.contains("* x86_64-unknown-linux-gnu"));
        assert!(text.contains("linux-aarch64-musl"));
    }

    #[test]
    fn list_marks_cross_targets() {
        let text = render_list(&TargetMatrix::builtin(), Some(OsFamily::Linux));
        let line = text.lines().find(|l| l.contains("x86_64-apple-darwin")).unwrap();
        assert!(line.ends_with("cross"));
        let line = text.lines().find(|l| l.contains("aarch64-unknown-linux-gnu")).unwrap();
        assert!(line.ends_with("native"));
    }

    #[test]
    fn describe_by_triple_or_platform() {
        let matrix = TargetMatrix::builtin();
        assert!(describe(&matrix, "aarch64-unknown-linux-musl", false).is_ok());
        assert!(describe(&matrix, "macos-aarch64", true).is_ok());
        assert_eq!(lookup("windows-x86_64").unwrap(), TargetTriple::X86_64_WINDOWS);
    }

    #[test]
    fn describe_unknown_target() {
        assert!(describe(&TargetMatrix::builtin(), "nonexistent", false).is_err());
    }
}
