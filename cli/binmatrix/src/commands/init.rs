//! `binmatrix init`: write a starter `binmatrix.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::manifest::{BinmatrixManifest, MANIFEST_FILE};

const IGNORED: &[&str] = &["target/", "release_artifacts/"];

pub fn run(dir: &Path, name: &str) -> Result<()> {
    let manifest = create_manifest(dir, name)?;
    println!("Created {}", manifest.display());
    Ok(())
}

pub(crate) fn create_manifest(dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == '/' || c == '\\') {
        bail!("invalid app name '{name}'");
    }
    let path = dir.join(MANIFEST_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    fs::write(&path, BinmatrixManifest::template(name))
        .with_context(|| format!("writing {}", path.display()))?;

    let gitignore = dir.join(".gitignore");
    let existing = match fs::read_to_string(&gitignore) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).context("reading .gitignore"),
    };
    let mut content = existing.clone();
    for entry in IGNORED {
        if !existing.lines().any(|l| l.trim() == *entry) {
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(entry);
            content.push('\n');
        }
    }
    if content != existing {
        fs::write(&gitignore, content).context("writing .gitignore")?;
    }

    Ok(path)
}
