//! Packed artifact inspection

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tar::Archive;
use tracing::{debug, warn};

use liftoff_core::error::AdapterError;

/// One member of a packed artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveFile {
    /// Path inside the archive, e.g. `package/index.js`
    pub path: String,
    /// Uncompressed size in bytes
    pub size: u64,
}

/// Metadata of a packed artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageArchiveInfo {
    pub filename: String,
    pub path: PathBuf,
    /// Size of the `.tgz` on disk
    pub size: u64,
    /// Sum of member sizes
    pub unpacked_size: u64,
    pub files: Vec<ArchiveFile>,
    pub created_at: DateTime<Utc>,
    /// Hex SHA-256 of the archive bytes
    pub sha256: String,
}

/// Deletes the artifact when dropped
#[derive(Debug)]
pub struct ArchiveGuard {
    path: PathBuf,
}

impl ArchiveGuard {
    /// Take ownership of the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Guarded file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArchiveGuard {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed packed artifact"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove packed artifact"),
        }
    }
}

/// Read a gzipped tarball and describe its contents
pub fn inspect(path: &Path) -> Result<PackageArchiveInfo, AdapterError> {
    let invalid = |reason: String| AdapterError::InvalidArchive {
        path: path.to_path_buf(),
        reason,
    };

    let data = std::fs::read(path)?;

    let mut hasher = Sha256::new();
    hasher.update(&data);
    let sha256 = format!("{:x}", hasher.finalize());

    let decoder = GzDecoder::new(&data[..]);
    let mut archive = Archive::new(decoder);

    let mut files = Vec::new();
    for entry in archive.entries().map_err(|e| invalid(e.to_string()))? {
        let mut entry = entry.map_err(|e| invalid(e.to_string()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let member = entry
            .path()
            .map_err(|e| invalid(e.to_string()))?
            .to_string_lossy()
            .replace('\\', "/");
        let size = std::io::copy(&mut entry, &mut std::io::sink())
            .map_err(|e| invalid(e.to_string()))?;
        files.push(ArchiveFile { path: member, size });
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let info = PackageArchiveInfo {
        filename,
        path: path.to_path_buf(),
        size: data.len() as u64,
        unpacked_size: files.iter().map(|f| f.size).sum(),
        files,
        created_at: Utc::now(),
        sha256,
    };

    debug!(
        filename = %info.filename,
        size = info.size,
        unpacked_size = info.unpacked_size,
        entries = info.files.len(),
        "inspected packed artifact"
    );
    Ok(info)
}

/// Write a small npm-style tarball, for tests that fake a pack command
#[cfg(test)]
pub(crate) fn write_test_tarball(path: &Path, members: &[(&str, &str)]) {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let file = std::fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, content) in members {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("package/{}", name), content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}
