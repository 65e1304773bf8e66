//! Atomic file output for exports.
//!
//! Archives and QR images are written to a temporary sibling, synced to
//! disk, then renamed into place, so a reader never sees a half-written
//! zip.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::export::archive::Archive;

/// Write bytes to a file atomically.
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Write an archive into `dir` under its own file name.
///
/// Returns the full path written.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub fn write_archive(dir: &Path, archive: &Archive) -> Result<PathBuf> {
    let path = dir.join(&archive.filename);
    atomic_write(&path, &archive.bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/out.zip");

        atomic_write(&path, b"PK\x03\x04").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"PK\x03\x04");
        assert!(!temp_dir.path().join("nested/out.zip.tmp").exists());
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.zip");
        fs::write(&path, b"old").unwrap();

        atomic_write(&path, b"new").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_write_archive_uses_archive_filename() {
        let temp_dir = TempDir::new().unwrap();
        let archive = Archive {
            filename: "export-monitoreo-cavernas-2024-09-01.zip".to_string(),
            bytes: vec![1, 2, 3],
            skipped_qr: Vec::new(),
        };

        let path = write_archive(temp_dir.path(), &archive).unwrap();

        assert_eq!(path, temp_dir.path().join(&archive.filename));
        assert_eq!(fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}
