//! Persistence controller.
//!
//! Decides when in-memory state reaches the backing document: on every
//! mutation in auto-commit mode, only on explicit commit in manual mode,
//! and never while a transaction body is running (the transaction runner
//! performs a single flush after a successful body).

use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::store::Collections;
use serde_json::Value;
use shelfdb_storage::{DocumentBackend, FileBackend};
use std::collections::BTreeMap;
use std::path::Path;

/// When mutations are flushed to the backing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Every mutation is flushed immediately.
    Auto,
    /// Flushing waits for an explicit commit.
    Manual,
}

/// Governs serialization of the collection map to the backing document.
pub(crate) struct Persistence {
    backend: Box<dyn DocumentBackend>,
    mode: CommitMode,
    pretty: bool,
    // > 0 while inside a transaction body; implicit flushes are withheld.
    defer_depth: u32,
}

impl Persistence {
    pub(crate) fn new(backend: Box<dyn DocumentBackend>, mode: CommitMode, pretty: bool) -> Self {
        Self {
            backend,
            mode,
            pretty,
            defer_depth: 0,
        }
    }

    pub(crate) fn mode(&self) -> CommitMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: CommitMode) {
        self.mode = mode;
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        self.backend.path()
    }

    /// Loads the initial collection map from the backing document.
    ///
    /// An absent document is an empty database.
    pub(crate) fn load(&self) -> CoreResult<Collections> {
        match self.backend.read()? {
            Some(bytes) => decode(&bytes),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Flush request after a mutation.
    ///
    /// Writes only in auto-commit mode and outside transaction deferral;
    /// otherwise the mutation stays in memory.
    pub(crate) fn flush(&mut self, collections: &Collections) -> CoreResult<()> {
        if self.mode == CommitMode::Auto && self.defer_depth == 0 {
            self.write(collections)?;
        }
        Ok(())
    }

    /// Unconditional write of current state to the backing document.
    pub(crate) fn commit(&mut self, collections: &Collections) -> CoreResult<()> {
        self.write(collections)
    }

    fn write(&mut self, collections: &Collections) -> CoreResult<()> {
        let bytes = encode(collections, self.pretty)?;
        self.backend.write(&bytes)?;
        tracing::debug!(bytes = bytes.len(), "flushed database document");
        Ok(())
    }

    /// Withholds implicit flushes until the matching [`Self::end_deferral`].
    pub(crate) fn begin_deferral(&mut self) {
        self.defer_depth += 1;
    }

    pub(crate) fn end_deferral(&mut self) {
        self.defer_depth = self.defer_depth.saturating_sub(1);
    }

    /// Serializes current state to `path`, leaving the backing document
    /// and in-memory state untouched.
    pub(crate) fn backup(&self, path: &Path, collections: &Collections) -> CoreResult<()> {
        require_json_path(path)?;
        let bytes = encode(collections, self.pretty)?;
        FileBackend::new(path).write(&bytes)?;
        Ok(())
    }

    /// Loads a replacement collection map from `path`.
    ///
    /// Fails with `BackupFileNotFound` if the file does not exist. The
    /// caller installs the result and requests a flush.
    pub(crate) fn read_backup(&self, path: &Path) -> CoreResult<Collections> {
        require_json_path(path)?;
        let backend = FileBackend::new(path);
        match backend.read()? {
            Some(bytes) => decode(&bytes),
            None => Err(CoreError::BackupFileNotFound {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("mode", &self.mode)
            .field("pretty", &self.pretty)
            .field("path", &self.backend.path())
            .finish_non_exhaustive()
    }
}

/// Fails with `InvalidFileType` unless the path ends in `.json`.
pub(crate) fn require_json_path(path: &Path) -> CoreResult<()> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(())
    } else {
        Err(CoreError::InvalidFileType {
            path: path.to_path_buf(),
        })
    }
}

fn encode(collections: &Collections, pretty: bool) -> CoreResult<Vec<u8>> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(collections)?
    } else {
        serde_json::to_vec(collections)?
    };
    Ok(bytes)
}

/// Parses and shape-checks a database document: a top-level object whose
/// values are arrays of objects.
fn decode(bytes: &[u8]) -> CoreResult<Collections> {
    let root: Value = serde_json::from_slice(bytes)?;
    let Value::Object(top) = root else {
        return Err(CoreError::malformed_document(
            "top-level value must be an object",
        ));
    };

    let mut collections = BTreeMap::new();
    for (name, value) in top {
        let Value::Array(entries) = value else {
            return Err(CoreError::malformed_document(format!(
                "collection '{name}' must be an array"
            )));
        };
        let mut records: Vec<Record> = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Value::Object(map) => records.push(map),
                other => {
                    return Err(CoreError::malformed_document(format!(
                        "collection '{name}' contains {}, records must be objects",
                        crate::record::type_name(&other)
                    )))
                }
            }
        }
        collections.insert(name, records);
    }
    Ok(collections)
}
