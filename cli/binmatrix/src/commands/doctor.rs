//! `binmatrix doctor`: toolchain and host diagnostics.

use std::path::Path;
use std::process::Command;

use anyhow::Result;
use binmatrix_resolve::{HostDescriptor, HostSignature, ResolverEnv};
use binmatrix_targets::{OsFamily, TargetMatrix, Toolchain, PLATFORM_TABLE_VERSION};

use crate::manifest::BinmatrixManifest;

pub fn run(project_dir: &Path) -> Result<()> {
    println!("=== binmatrix Doctor ===");
    println!();
    println!("binmatrix version:      {}", env!("CARGO_PKG_VERSION"));
    println!("Platform table version: {PLATFORM_TABLE_VERSION}");
    println!();

    println!("--- Host ---");
    let descriptor = HostDescriptor::current();
    println!("  Descriptor: {descriptor}");
    match HostSignature::classify(&descriptor) {
        Ok(sig) => println!("  Platform:   {} ({})", sig.platform(), sig.triple()),
        Err(e) => println!("  Platform:   {e}"),
    }
    let env = ResolverEnv::from_process();
    if let Some(path) = &env.override_path {
        println!("  Override:   {}", path.display());
    }
    println!();

    println!("--- System Tools ---");
    for tool in ["cargo", "rustup", "cross", "cbindgen"] {
        print_tool_status(tool, &["--version"]);
    }
    println!();

    let mut matrix = TargetMatrix::builtin();
    println!("--- Project Status ---");
    match BinmatrixManifest::find_and_load(project_dir) {
        Ok(Some((manifest, dir))) => {
            println!("  binmatrix.toml: found at {}", dir.display());
            println!("  App:            {}", manifest.project.name);
            match manifest.matrix() {
                Ok(m) => matrix = m,
                Err(e) => println!("  Matrix:         invalid ({e:#})"),
            }
        }
        Ok(None) => println!("  binmatrix.toml: not found"),
        Err(e) => println!("  binmatrix.toml: error: {e:#}"),
    }
    println!();

    println!("--- Toolchains ---");
    let installed = installed_rust_targets();
    let host = OsFamily::current();
    for entry in matrix.entries() {
        let status = match host.map(|h| Toolchain::select(h, entry.triple)) {
            None => "unsupported host".to_string(),
            Some(Toolchain::Native) => match &installed {
                Some(list) if list.iter().any(|t| *t == entry.triple.to_string()) => {
                    "native, target installed".to_string()
                }
                Some(_) => "native, target missing (rustup target add)".to_string(),
                None => "native, rustup not found".to_string(),
            },
            Some(Toolchain::Cross) => "cross".to_string(),
        };
        println!("  {:<28} {status}", entry.triple.to_string());
    }

    Ok(())
}

fn installed_rust_targets() -> Option<Vec<String>> {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
    )
}

fn print_tool_status(name: &str, args: &[&str]) {
    match Command::new(name).args(args).output() {
        Ok(output) => {
            let version = String::from_utf8_lossy(&output.stdout);
            let first_line = version.lines().next().unwrap_or("(unknown version)");
            println!("  {name}: {first_line}");
        }
        Err(_) => {
            println!("  {name}: not found");
        }
    }
}
