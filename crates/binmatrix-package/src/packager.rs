//! Turn raw build outputs into distributable files.
//!
//! Layout of the shared artifacts directory:
//! ```text
//! <artifacts_dir>/
//!   <app>-<platform>.<ext>.gz         : gzip-compressed artifact
//!   <app>-<platform>.<ext>.gz.sha256  : checksum of the .gz bytes
//! ```

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use binmatrix_targets::artifact::{checksum_file_name, packaged_file_name};
use binmatrix_targets::{ArtifactKind, PlatformName, TargetTriple};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::checksum::Checksum;
use crate::error::{PackageError, Result};

/// A packaged artifact. Created once per successful packaging step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub triple: TargetTriple,
    pub kind: ArtifactKind,
    pub raw_path: PathBuf,
    pub compressed_path: PathBuf,
    pub checksum_path: PathBuf,
    pub checksum: Checksum,
}

/// Packages artifacts for one application into a shared directory.
#[derive(Debug, Clone)]
pub struct Packager {
    artifacts_dir: PathBuf,
    app_name: String,
}

impl Packager {
    pub fn new(artifacts_dir: impl Into<PathBuf>, app_name: impl Into<String>) -> Self {
        Packager {
            artifacts_dir: artifacts_dir.into(),
            app_name: app_name.into(),
        }
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// Where `package` writes the compressed file for this platform and kind.
    pub fn compressed_path(&self, platform: PlatformName, kind: ArtifactKind) -> PathBuf {
        self.artifacts_dir
            .join(packaged_file_name(&self.app_name, platform, kind))
    }

    /// Compress `raw_path` and write its checksum sidecar.
    ///
    /// Fails with [`PackageError::PackagingIoFailure`] if the raw file does not
    /// exist; in that case nothing is written.
    pub fn package(
        &self,
        raw_path: &Path,
        platform: PlatformName,
        kind: ArtifactKind,
    ) -> Result<Artifact> {
        if !raw_path.is_file() {
            return Err(PackageError::PackagingIoFailure {
                path: raw_path.to_path_buf(),
                detail: "expected build output does not exist".into(),
            });
        }

        fs::create_dir_all(&self.artifacts_dir)
            .map_err(|e| PackageError::io_at(&self.artifacts_dir, e))?;

        let file_name = packaged_file_name(&self.app_name, platform, kind);
        let compressed_path = self.artifacts_dir.join(&file_name);
        let checksum_path = self.artifacts_dir.join(checksum_file_name(&file_name));

        let partial = partial_path(&compressed_path);
        let sidecar_partial = partial_path(&checksum_path);
        let staged = (|| -> io::Result<Checksum> {
            compress_file(raw_path, &partial)?;
            let checksum = Checksum::of_file(&partial)?;
            fs::write(&sidecar_partial, checksum.sidecar_line(&file_name))?;
            Ok(checksum)
        })();
        let checksum = match staged {
            Ok(checksum) => checksum,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                let _ = fs::remove_file(&sidecar_partial);
                return Err(PackageError::io_at(&partial, e));
            }
        };

        // Both files land or neither does.
        if let Err(e) = fs::rename(&partial, &compressed_path) {
            let _ = fs::remove_file(&partial);
            let _ = fs::remove_file(&sidecar_partial);
            return Err(PackageError::io_at(&compressed_path, e));
        }
        if let Err(e) = fs::rename(&sidecar_partial, &checksum_path) {
            let _ = fs::remove_file(&compressed_path);
            let _ = fs::remove_file(&sidecar_partial);
            return Err(PackageError::io_at(&checksum_path, e));
        }

        log::info!(
            "packaged {} -> {} ({})",
            raw_path.display(),
            compressed_path.display(),
            checksum
        );

        Ok(Artifact {
            triple: platform.triple(),
            kind,
            raw_path: raw_path.to_path_buf(),
            compressed_path,
            checksum_path,
            checksum,
        })
    }
}

/// Check a packaged file against its `.sha256` sidecar.
pub fn verify(compressed_path: &Path) -> Result<Checksum> {
    let sidecar = sidecar_path(compressed_path);
    let expected = Checksum::read_sidecar(&sidecar)?;
    let actual = Checksum::of_file(compressed_path).map_err(|e| PackageError::io_at(compressed_path, e))?;
    if actual != expected {
        return Err(PackageError::ChecksumMismatch {
            path: compressed_path.to_path_buf(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(actual)
}

/// Verify and decompress a packaged file into `dest`.
pub fn unpack(compressed_path: &Path, dest: &Path) -> Result<PathBuf> {
    verify(compressed_path)?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| PackageError::io_at(parent, e))?;
    }
    let partial = partial_path(dest);
    let result = (|| -> io::Result<()> {
        let mut decoder = GzDecoder::new(BufReader::new(File::open(compressed_path)?));
        let mut out = BufWriter::new(File::create(&partial)?);
        io::copy(&mut decoder, &mut out)?;
        out.flush()
    })();
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(PackageError::io_at(compressed_path, e));
    }
    fs::rename(&partial, dest).map_err(|e| PackageError::io_at(dest, e))?;
    log::info!("unpacked {} -> {}", compressed_path.display(), dest.display());
    Ok(dest.to_path_buf())
}

fn compress_file(src: &Path, dest: &Path) -> io::Result<()> {
    let mut input = BufReader::new(File::open(src)?);
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(dest)?), Compression::best());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.flush()
}

fn sidecar_path(compressed_path: &Path) -> PathBuf {
    let mut name = compressed_path.as_os_str().to_owned();
    name.push(binmatrix_targets::artifact::CHECKSUM_SUFFIX);
    PathBuf::from(name)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
