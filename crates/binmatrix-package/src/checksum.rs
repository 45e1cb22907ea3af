//! SHA-256 checksums and `sha256sum`-compatible sidecar files.
//!
//! A sidecar holds one line: `<hex digest>  <file name>`.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{PackageError, Result};

/// A SHA-256 hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    /// Hash an in-memory buffer.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Checksum(hex_encode(&hasher.finalize()))
    }

    /// Hash a file without loading it whole.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Checksum(hex_encode(&hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the sidecar line for `file_name`.
    pub fn sidecar_line(&self, file_name: &str) -> String {
        format!("{}  {file_name}\n", self.0)
    }

    /// Parse a sidecar file, returning the digest it records.
    pub fn read_sidecar(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PackageError::InvalidSidecar {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let digest = content.split_whitespace().next().unwrap_or_default();
        if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PackageError::InvalidSidecar {
                path: path.to_path_buf(),
                detail: format!("'{digest}' is not a SHA-256 hex digest"),
            });
        }
        Ok(Checksum(digest.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
