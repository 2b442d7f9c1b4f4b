//! Database configuration.

use crate::record::Record;
use std::collections::BTreeMap;

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether every mutation is flushed to the backing file immediately.
    ///
    /// When `false`, mutations are applied in memory only until an
    /// explicit [`crate::Database::commit`].
    pub auto_commit: bool,

    /// Whether to emit human-readable success notices.
    ///
    /// Has no behavioral effect; errors are reported either way.
    pub verbose: bool,

    /// Whether the backing file is pretty-printed.
    ///
    /// Cosmetic only; the parsed document is identical either way.
    pub pretty: bool,

    /// Per-collection default field values applied on insert.
    ///
    /// Fields the caller's record does not specify are filled in from
    /// here; explicit values always win.
    pub default_values: BTreeMap<String, Record>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_commit: true,
            verbose: false,
            pretty: false,
            default_values: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether mutations are flushed immediately.
    #[must_use]
    pub const fn auto_commit(mut self, value: bool) -> Self {
        self.auto_commit = value;
        self
    }

    /// Sets whether success notices are emitted.
    #[must_use]
    pub const fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Sets whether the backing file is pretty-printed.
    #[must_use]
    pub const fn pretty(mut self, value: bool) -> Self {
        self.pretty = value;
        self
    }

    /// Registers default field values for a collection.
    #[must_use]
    pub fn default_values(mut self, collection: impl Into<String>, defaults: Record) -> Self {
        self.default_values.insert(collection.into(), defaults);
        self
    }
}
