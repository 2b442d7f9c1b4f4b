//! Error types for shelfdb core.

use crate::schema::ValidationFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in shelfdb core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] shelfdb_storage::StorageError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Construction given a path without a JSON file extension.
    #[error("invalid file type: {path} is not a .json path")]
    InvalidFileType {
        /// The offending path.
        path: PathBuf,
    },

    /// Insert or bulk insert given a malformed record shape.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of what was wrong with the record.
        message: String,
    },

    /// The named collection does not exist.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Name of the collection.
        name: String,
    },

    /// The target collection name is already taken.
    #[error("collection already exists: {name}")]
    CollectionExists {
        /// Name of the collection.
        name: String,
    },

    /// The key is not present in any record of the collection.
    #[error("key '{key}' not found in any record of collection '{collection}'")]
    KeyNotFound {
        /// The collection searched.
        collection: String,
        /// The key that was not found.
        key: String,
    },

    /// A lookup-based mutation matched zero records.
    #[error("no record in collection '{collection}' matches {key} == {value}")]
    NoMatch {
        /// The collection searched.
        collection: String,
        /// The key used for the lookup.
        key: String,
        /// The value used for the lookup (JSON text).
        value: String,
    },

    /// A record did not satisfy the collection's schema.
    #[error(
        "schema validation failed for collection '{collection}': {}",
        .failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    SchemaValidationFailed {
        /// The collection whose schema rejected the record.
        collection: String,
        /// Per-field failures, in schema order.
        failures: Vec<ValidationFailure>,
    },

    /// A condition string was malformed or referenced an absent field.
    #[error("cannot evaluate condition '{condition}': {message}")]
    ConditionEvaluationFailed {
        /// The offending condition text.
        condition: String,
        /// What went wrong.
        message: String,
    },

    /// A transaction body failed and the database was rolled back.
    #[error("transaction rolled back: {source}")]
    TransactionFailed {
        /// The failure that triggered the rollback.
        #[source]
        source: Box<CoreError>,
    },

    /// Restore given a path that does not exist.
    #[error("backup file not found: {path}")]
    BackupFileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The backing file is not a valid shelfdb document.
    #[error("malformed database document: {message}")]
    MalformedDocument {
        /// Description of the shape violation.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Creates a collection not found error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Creates a collection exists error.
    pub fn collection_exists(name: impl Into<String>) -> Self {
        Self::CollectionExists { name: name.into() }
    }

    /// Creates a key not found error.
    pub fn key_not_found(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self::KeyNotFound {
            collection: collection.into(),
            key: key.into(),
        }
    }

    /// Creates a no match error.
    pub fn no_match(
        collection: impl Into<String>,
        key: impl Into<String>,
        value: &serde_json::Value,
    ) -> Self {
        Self::NoMatch {
            collection: collection.into(),
            key: key.into(),
            value: value.to_string(),
        }
    }

    /// Creates a condition evaluation error.
    pub fn condition_failed(condition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConditionEvaluationFailed {
            condition: condition.into(),
            message: message.into(),
        }
    }

    /// Wraps the cause of a rolled-back transaction.
    pub fn transaction_failed(source: CoreError) -> Self {
        Self::TransactionFailed {
            source: Box::new(source),
        }
    }

    /// Creates a malformed document error.
    pub fn malformed_document(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }
}
