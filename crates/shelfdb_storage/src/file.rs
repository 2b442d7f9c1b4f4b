//! File-based document backend for persistent storage.

use crate::backend::DocumentBackend;
use crate::error::{StorageError, StorageResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A file-based document backend.
///
/// The document is a single file on disk, rewritten in full on every
/// `write`. Writes go through a sibling temporary file followed by a
/// rename, so a crash mid-write leaves the previous document intact.
///
/// The file is created lazily on the first `write`; constructing the
/// backend against a nonexistent path is not an error.
///
/// # Example
///
/// ```no_run
/// use shelfdb_storage::{DocumentBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::new(Path::new("data.json"));
/// backend.write(b"{}").unwrap();
/// assert!(backend.read().unwrap().is_some());
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Creates a backend for the given path.
    ///
    /// The path does not need to exist; the file is created on first write.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl DocumentBackend for FileBackend {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.is_file() => Ok(Some(fs::read(&self.path)?)),
            Ok(_) => Err(StorageError::NotAFile {
                path: self.path.clone(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename keeps the previous document if we crash mid-write.
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_none() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(&dir.path().join("absent.json"));
        assert!(backend.read().unwrap().is_none());
    }

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        let mut backend = FileBackend::new(&path);
        backend.write(b"{\"users\":[]}").unwrap();

        assert!(path.is_file());
        assert_eq!(backend.read().unwrap().unwrap(), b"{\"users\":[]}");
    }

    #[test]
    fn write_replaces_whole_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        let mut backend = FileBackend::new(&path);
        backend.write(b"first contents, quite long").unwrap();
        backend.write(b"second").unwrap();

        assert_eq!(backend.read().unwrap().unwrap(), b"second");
    }

    #[test]
    fn persists_across_backend_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        {
            let mut backend = FileBackend::new(&path);
            backend.write(b"persistent").unwrap();
        }

        let backend = FileBackend::new(&path);
        assert_eq!(backend.read().unwrap().unwrap(), b"persistent");
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("db.json");

        let mut backend = FileBackend::new(&path);
        backend.write(b"{}").unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn directory_at_path_is_rejected() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        assert!(matches!(
            backend.read(),
            Err(StorageError::NotAFile { .. })
        ));
    }

    #[test]
    fn no_file_created_before_first_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lazy.json");

        let _backend = FileBackend::new(&path);
        assert!(!path.exists());
    }

    #[test]
    fn reports_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        let backend = FileBackend::new(&path);
        assert_eq!(backend.path(), Some(path.as_path()));
    }
}
