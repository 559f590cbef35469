//! Zip extraction backed by the `zip` crate

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::warn;
use zip::ZipArchive;

use super::{EntryKind, ExtractedEntry};
use crate::core::{NccError, NccResult};

/// Extract a zip archive into a directory
pub fn extract(archive_path: &Path, destination: &Path) -> NccResult<Vec<ExtractedEntry>> {
    let file = File::open(archive_path).map_err(|e| {
        NccError::operation(format!(
            "Failed to open zip archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        NccError::operation(format!(
            "Failed to read zip archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;

    fs::create_dir_all(destination).map_err(|e| {
        NccError::operation(format!(
            "Failed to create destination {}: {}",
            destination.display(),
            e
        ))
    })?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| NccError::operation(format!("Failed to extract zip entry {}: {}", i, e)))?;

        // Entries escaping the destination are dropped
        let relative = match file.enclosed_name() {
            Some(path) => path.to_owned(),
            None => {
                warn!("Skipping zip entry outside of destination: {}", file.name());
                continue;
            }
        };
        let target = destination.join(&relative);

        if file.is_dir() {
            fs::create_dir_all(&target)?;
            entries.push(ExtractedEntry {
                relative_path: relative,
                kind: EntryKind::Directory,
                size: 0,
            });
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut output = File::create(&target).map_err(|e| {
            NccError::operation(format!("Failed to create file {}: {}", target.display(), e))
        })?;
        let size = io::copy(&mut file, &mut output).map_err(|e| {
            NccError::operation(format!("Failed to extract {}: {}", relative.display(), e))
        })?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o7777));
        }

        entries.push(ExtractedEntry {
            relative_path: relative,
            kind: EntryKind::File,
            size,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_extract_zip() {
        let work = tempdir().unwrap();
        let archive_path = work.path().join("source.zip");

        let mut writer = zip::ZipWriter::new(File::create(&archive_path).unwrap());
        writer
            .add_directory("src/", SimpleFileOptions::default())
            .unwrap();
        writer
            .start_file("src/main.php", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<?php echo 1;").unwrap();
        writer.finish().unwrap();

        let dest = work.path().join("out");
        let entries = extract(&archive_path, &dest).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(fs::read(dest.join("src/main.php")).unwrap(), b"<?php echo 1;");
    }

    #[test]
    fn test_invalid_zip_is_an_operation_error() {
        let work = tempdir().unwrap();
        let archive_path = work.path().join("broken.zip");
        fs::write(&archive_path, b"not a zip").unwrap();
        let result = extract(&archive_path, &work.path().join("out"));
        assert!(matches!(result, Err(NccError::Operation(_))));
    }
}
