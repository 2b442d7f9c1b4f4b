//! Document backend trait definition.

use crate::error::StorageResult;
use std::path::Path;

/// A low-level document backend for shelfdb.
///
/// Backends are **opaque document stores**. They hold a single byte document
/// and provide whole-document read and write. shelfdb core owns all format
/// interpretation: backends do not understand collections or records.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `write`,
///   or `None` if nothing has ever been written (and, for files, the
///   file does not exist)
/// - `write` replaces the entire document; after it returns successfully
///   the previous contents are unrecoverable through this backend
/// - A backend that has never been written to does not create its file
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing and transient databases
/// - [`super::FileBackend`] - For persistent storage
pub trait DocumentBackend: Send + Sync {
    /// Reads the entire document.
    ///
    /// Returns `None` if no document exists yet (for a file backend,
    /// the file has not been created).
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the entire document with `data`.
    ///
    /// Creates the underlying resource if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs. On error the previous
    /// document contents are preserved where the backend can guarantee it.
    fn write(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Returns the filesystem path backing this store, if any.
    ///
    /// In-memory backends return `None`.
    fn path(&self) -> Option<&Path>;
}
