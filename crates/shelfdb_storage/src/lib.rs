//! # shelfdb Storage
//!
//! Document persistence backends for shelfdb.
//!
//! This crate provides the lowest-level persistence abstraction for shelfdb.
//! Backends are **opaque document stores**: they hold a single byte document
//! (in practice, the serialized JSON database) and know nothing about
//! collections, records, or the JSON format itself.
//!
//! ## Design Principles
//!
//! - Backends hold exactly one document (read all, write all)
//! - No knowledge of shelfdb's collection/record model
//! - shelfdb core owns all format interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and transient databases
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use shelfdb_storage::{DocumentBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! assert!(backend.read().unwrap().is_none());
//! backend.write(b"{}").unwrap();
//! assert_eq!(backend.read().unwrap().as_deref(), Some(&b"{}"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::DocumentBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
