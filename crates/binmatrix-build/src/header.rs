//! Language-binding header emission.
//!
//! The header generator is an opaque external tool (`cbindgen` by default).
//! It runs at most once per release, tied to the matrix's primary triple.

use std::path::{Path, PathBuf};

use crate::toolchain::Invocation;

/// Configuration for the external header generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEmitter {
    /// Generator program name.
    pub tool: String,
    /// Crate to generate bindings for.
    pub crate_name: String,
    /// Optional generator config file, relative to the project dir.
    pub config_file: Option<PathBuf>,
}

impl HeaderEmitter {
    pub fn cbindgen(crate_name: impl Into<String>) -> Self {
        HeaderEmitter {
            tool: "cbindgen".into(),
            crate_name: crate_name.into(),
            config_file: None,
        }
    }

    pub fn probe_invocation(&self) -> Invocation {
        Invocation::new(&self.tool).arg("--version")
    }

    pub fn install_invocation(&self) -> Invocation {
        Invocation::new("cargo").args(["install", self.tool.as_str(), "--locked"])
    }

    /// Generate the header into `output`.
    pub fn emit_invocation(&self, project_dir: &Path, output: &Path) -> Invocation {
        let mut inv = Invocation::new(&self.tool);
        if let Some(config) = &self.config_file {
            inv = inv.args(["--config".to_string(), config.display().to_string()]);
        }
        inv.args(["--crate", self.crate_name.as_str()])
            .args(["--output".to_string(), output.display().to_string()])
            .cwd(project_dir)
    }
}
