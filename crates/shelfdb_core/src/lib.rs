//! # shelfdb Core
//!
//! An in-process, file-backed JSON document store.
//!
//! A single JSON file holds named collections of schema-less records.
//! This crate provides:
//! - CRUD, bulk operations, and lookups over those records
//! - A flat condition-expression query evaluator
//! - Optional per-collection schemas and insert defaults
//! - Auto-commit / manual-commit persistence over a backing file
//! - Transactions with snapshot rollback
//!
//! ```rust
//! use shelfdb_core::Database;
//! use serde_json::json;
//!
//! # fn main() -> shelfdb_core::CoreResult<()> {
//! let mut db = Database::open_in_memory()?;
//! db.insert("posts", json!({"id": 1, "title": "A", "views": 100}))?;
//! db.insert("posts", json!({"id": 2, "title": "B", "views": 250}))?;
//!
//! let hot = db.query("posts", "views > 200")?;
//! assert_eq!(hot.len(), 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod condition;
mod config;
mod database;
mod error;
mod persistence;
mod record;
mod schema;
mod store;
mod transaction;

pub use condition::{Condition, ConditionError};
pub use config::Config;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use persistence::CommitMode;
pub use record::Record;
pub use schema::{FieldPredicate, FieldType, Rule, Schema, ValidationFailure};
