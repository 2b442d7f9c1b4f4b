//! In-memory document backend for testing and transient databases.

use crate::backend::DocumentBackend;
use crate::error::StorageResult;
use std::path::Path;

/// An in-memory document backend.
///
/// Holds the document in a `Vec<u8>` with no persistence. Suitable for:
/// - Unit tests
/// - Transient databases that never touch disk
///
/// # Example
///
/// ```rust
/// use shelfdb_storage::{DocumentBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// assert!(backend.read().unwrap().is_none());
/// backend.write(b"{}").unwrap();
/// assert_eq!(backend.read().unwrap().as_deref(), Some(&b"{}"[..]));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    document: Option<Vec<u8>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory backend pre-loaded with a document.
    ///
    /// Useful for testing load-at-construction behavior.
    #[must_use]
    pub fn with_document(document: Vec<u8>) -> Self {
        Self {
            document: Some(document),
        }
    }
}

impl DocumentBackend for InMemoryBackend {
    fn read(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.document.clone())
    }

    fn write(&mut self, data: &[u8]) -> StorageResult<()> {
        self.document = Some(data.to_vec());
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        None
    }
}
