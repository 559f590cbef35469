//! Archive extraction for fetched sources
//!
//! Tar archives (optionally gzip or bzip2 compressed) are read by a small
//! streaming USTAR reader; zip archives go through the `zip` crate.

pub mod tar;
pub mod zip;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::core::{NccError, NccResult};

/// Kind of an extracted filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// An entry written to the destination directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Path relative to the destination
    pub relative_path: PathBuf,
    pub kind: EntryKind,
    /// Size in bytes, zero for directories
    pub size: u64,
}

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from leading bytes, falling back to the file extension
    pub fn detect(path: &Path) -> NccResult<Self> {
        let mut head = [0u8; 4];
        let read = File::open(path)
            .and_then(|mut f| f.read(&mut head))
            .map_err(|e| {
                NccError::operation(format!("Archive not readable {}: {}", path.display(), e))
            })?;

        if read >= 4 && head == *b"PK\x03\x04" {
            return Ok(ArchiveFormat::Zip);
        }

        let name = path.to_string_lossy().to_lowercase();
        if name.ends_with(".zip") {
            Ok(ArchiveFormat::Zip)
        } else {
            Ok(ArchiveFormat::Tar)
        }
    }
}

/// Extract an archive into `destination`, creating it if needed
pub fn extract(archive_path: &Path, destination: &Path) -> NccResult<Vec<ExtractedEntry>> {
    if !archive_path.is_file() {
        return Err(NccError::operation(format!(
            "Archive file not found: {}",
            archive_path.display()
        )));
    }

    match ArchiveFormat::detect(archive_path)? {
        ArchiveFormat::Tar => tar::extract(archive_path, destination),
        ArchiveFormat::Zip => zip::extract(archive_path, destination),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_archive() {
        let dir = tempdir().unwrap();
        let result = extract(&dir.path().join("nope.tar"), dir.path());
        assert!(matches!(result, Err(NccError::Operation(_))));
    }

    #[test]
    fn test_detect_zip_by_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.bin");
        std::fs::write(&path, b"PK\x03\x04rest").unwrap();
        assert_eq!(ArchiveFormat::detect(&path).unwrap(), ArchiveFormat::Zip);

        let path = dir.path().join("archive.tar");
        std::fs::write(&path, b"plain").unwrap();
        assert_eq!(ArchiveFormat::detect(&path).unwrap(), ArchiveFormat::Tar);
    }
}
