//! `binmatrix clean`: remove build output.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::manifest::Project;

/// Remove the target dir, and the artifacts dir when `artifacts` is set.
pub fn run(project: &Project, artifacts: bool) -> Result<()> {
    remove_dir(&project.target_dir())?;
    if artifacts {
        remove_dir(&project.artifacts_dir())?;
    }
    Ok(())
}

fn remove_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("removing {}", dir.display()))?;
        println!("Removed {}", dir.display());
    } else {
        println!("Already clean: {} does not exist", dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build::tests::project_in;

    #[test]
    fn clean_keeps_artifacts_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"x\"\n");
        fs::create_dir_all(project.target_dir().join("x86_64-unknown-linux-gnu")).unwrap();
        fs::create_dir_all(project.artifacts_dir()).unwrap();

        run(&project, false).unwrap();
        assert!(!project.target_dir().exists());
        assert!(project.artifacts_dir().exists());
    }

    #[test]
    fn clean_with_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"x\"\n");
        fs::create_dir_all(project.target_dir()).unwrap();
        fs::create_dir_all(project.artifacts_dir()).unwrap();

        run(&project, true).unwrap();
        assert!(!project.target_dir().exists());
        assert!(!project.artifacts_dir().exists());
    }

    #[test]
    fn clean_handles_already_clean() {
        let dir = tempfile::tempdir().unwrap();
        let project = project_in(dir.path(), "[project]\nname = \"x\"\n");
        run(&project, true).unwrap();
    }
}
