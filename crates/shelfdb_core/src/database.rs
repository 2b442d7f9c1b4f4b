//! Database façade.

use crate::condition::Condition;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::persistence::{require_json_path, CommitMode, Persistence};
use crate::record::{self, Record};
use crate::schema::Schema;
use crate::store::RecordStore;
use serde_json::Value;
use shelfdb_storage::{DocumentBackend, FileBackend, InMemoryBackend};
use std::collections::BTreeMap;
use std::path::Path;

/// The main database handle.
///
/// A `Database` owns a set of named collections of schema-less records,
/// backed by a single JSON file. It provides:
/// - CRUD and bulk mutation over records
/// - Condition queries, predicate filters, and substring search
/// - Optional per-collection schemas and insert defaults
/// - Auto-commit or manual-commit persistence
/// - Transactions with snapshot rollback
///
/// # Opening a Database
///
/// ```rust,ignore
/// use shelfdb_core::Database;
/// use serde_json::json;
///
/// let mut db = Database::open("posts.json")?;
/// db.insert("posts", json!({"id": 1, "title": "A", "views": 100}))?;
/// let hot = db.query("posts", "views > 50")?;
/// ```
///
/// # Transient Databases
///
/// For testing, or when no file should be touched, use
/// [`Database::open_in_memory`].
///
/// # Concurrency
///
/// A `Database` assumes one logical caller at a time: mutation takes
/// `&mut self` and there is no internal locking. Wrap the whole value in
/// your own mutual exclusion if you need to share it across threads.
pub struct Database {
    verbose: bool,
    store: RecordStore,
    schemas: BTreeMap<String, Schema>,
    defaults: BTreeMap<String, Record>,
    pub(crate) persistence: Persistence,
}

impl Database {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Opens a database backed by the JSON file at `path`.
    ///
    /// If the file exists its contents become the initial state; if not,
    /// the database starts empty and the file is created on first write.
    ///
    /// # Errors
    ///
    /// - `InvalidFileType` if `path` does not end in `.json`
    /// - `MalformedDocument`/`Json` if the file exists but is not a valid
    ///   database document
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a database with custom configuration.
    ///
    /// ```rust,ignore
    /// let config = Config::new().auto_commit(false).pretty(true);
    /// let db = Database::open_with_config("posts.json", config)?;
    /// ```
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let path = path.as_ref();
        require_json_path(path)?;
        Self::open_with_backend(Box::new(FileBackend::new(path)), config)
    }

    /// Opens a fresh transient database that never touches disk.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_in_memory_with_config(Config::default())
    }

    /// Opens a transient database with custom configuration.
    pub fn open_in_memory_with_config(config: Config) -> CoreResult<Self> {
        Self::open_with_backend(Box::new(InMemoryBackend::new()), config)
    }

    /// Opens a database over a pre-configured backend.
    ///
    /// This is a lower-level constructor; prefer [`Database::open`].
    pub fn open_with_backend(
        backend: Box<dyn DocumentBackend>,
        config: Config,
    ) -> CoreResult<Self> {
        let mode = if config.auto_commit {
            CommitMode::Auto
        } else {
            CommitMode::Manual
        };
        let persistence = Persistence::new(backend, mode, config.pretty);
        let collections = persistence.load()?;

        Ok(Self {
            verbose: config.verbose,
            store: RecordStore::from_collections(collections),
            schemas: BTreeMap::new(),
            defaults: config.default_values,
            persistence,
        })
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Creates an empty collection if absent. Idempotent.
    pub fn ensure_collection(&mut self, name: &str) -> CoreResult<()> {
        if !self.store.contains(name) {
            self.store.ensure_collection(name);
            self.flush()?;
            self.notice(format!("created collection '{name}'"));
        }
        Ok(())
    }

    /// Inserts a record, creating the collection if needed.
    ///
    /// Defaults configured for the collection fill in fields the record
    /// does not specify; explicit values win. The record is then
    /// schema-validated if the collection has a schema.
    ///
    /// # Errors
    ///
    /// - `InvalidRecord` if `record` is not a non-empty field map with
    ///   non-empty field names
    /// - `SchemaValidationFailed` if the collection's schema rejects it
    pub fn insert(&mut self, collection: &str, record: Value) -> CoreResult<()> {
        let record = self.prepare(collection, record)?;
        self.store.ensure_collection(collection);
        self.store.append(collection, record)?;
        self.flush()?;
        self.notice(format!("inserted 1 record into '{collection}'"));
        Ok(())
    }

    /// Inserts a batch of records, all-or-nothing.
    ///
    /// Every record is shape-checked and schema-validated (after default
    /// merging) before any of them is appended; a failing batch leaves
    /// the collection untouched.
    ///
    /// # Errors
    ///
    /// `InvalidRecord` for an empty batch or any malformed record;
    /// `SchemaValidationFailed` if any record fails validation.
    pub fn bulk_insert(&mut self, collection: &str, records: Vec<Value>) -> CoreResult<usize> {
        if records.is_empty() {
            return Err(CoreError::invalid_record("bulk insert given an empty batch"));
        }
        let prepared = records
            .into_iter()
            .map(|r| self.prepare(collection, r))
            .collect::<CoreResult<Vec<_>>>()?;

        self.store.ensure_collection(collection);
        let count = prepared.len();
        for record in prepared {
            self.store.append(collection, record)?;
        }
        self.flush()?;
        self.notice(format!("inserted {count} records into '{collection}'"));
        Ok(count)
    }

    /// Shallow-merges `patch` into every record whose field `key` equals
    /// `value`. Patch fields overwrite; unmentioned fields are untouched.
    ///
    /// Every merged result is schema-validated before any of them is
    /// applied. Returns the number of records updated.
    ///
    /// # Errors
    ///
    /// `CollectionNotFound`, `KeyNotFound` (key absent from every
    /// record), `NoMatch` (key present, zero value matches),
    /// `InvalidRecord` (bad patch shape), `SchemaValidationFailed`.
    pub fn update(
        &mut self,
        collection: &str,
        key: &str,
        value: &Value,
        patch: Value,
    ) -> CoreResult<usize> {
        let patch = record::into_record(patch)?;
        let indices = self.store.find_indices(collection, key, value)?;
        if indices.is_empty() {
            return Err(CoreError::no_match(collection, key, value));
        }

        let records = self.store.records(collection)?;
        let mut replacements = Vec::with_capacity(indices.len());
        for &index in &indices {
            let mut merged = records[index].clone();
            record::merge(&mut merged, &patch);
            replacements.push((index, merged));
        }
        for (_, merged) in &replacements {
            self.check_schema(collection, merged)?;
        }

        let count = replacements.len();
        self.store.replace_at(collection, replacements)?;
        self.flush()?;
        self.notice(format!("updated {count} records in '{collection}'"));
        Ok(count)
    }

    /// Updates matching records, or inserts `{key: value, ..patch}` if
    /// nothing matches.
    ///
    /// Unlike [`Database::insert`], the target collection must already
    /// exist. Returns the number of records touched.
    pub fn upsert(
        &mut self,
        collection: &str,
        key: &str,
        value: &Value,
        patch: Value,
    ) -> CoreResult<usize> {
        if !self.store.contains(collection) {
            return Err(CoreError::collection_not_found(collection));
        }
        let patch = record::into_record(patch)?;

        // A key absent from every record is an ordinary no-match here.
        let indices = match self.store.find_indices(collection, key, value) {
            Ok(indices) => indices,
            Err(CoreError::KeyNotFound { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };

        if indices.is_empty() {
            let mut synthesized = Record::new();
            synthesized.insert(key.to_string(), value.clone());
            record::merge(&mut synthesized, &patch);
            self.insert(collection, Value::Object(synthesized))?;
            Ok(1)
        } else {
            self.update(collection, key, value, Value::Object(patch))
        }
    }

    /// Removes every record whose field `key` equals `value`.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// `CollectionNotFound`, `KeyNotFound`, or `NoMatch` as for
    /// [`Database::update`].
    pub fn delete(&mut self, collection: &str, key: &str, value: &Value) -> CoreResult<usize> {
        let indices = self.store.find_indices(collection, key, value)?;
        if indices.is_empty() {
            return Err(CoreError::no_match(collection, key, value));
        }
        let removed = self.store.remove_at(collection, indices)?;
        self.flush()?;
        self.notice(format!("deleted {removed} records from '{collection}'"));
        Ok(removed)
    }

    /// Empties a collection in place; the collection itself remains.
    pub fn clear(&mut self, collection: &str) -> CoreResult<()> {
        self.store.clear(collection)?;
        self.flush()?;
        self.notice(format!("cleared collection '{collection}'"));
        Ok(())
    }

    /// Removes a collection entirely.
    pub fn drop_collection(&mut self, collection: &str) -> CoreResult<()> {
        self.store.drop_collection(collection)?;
        self.flush()?;
        self.notice(format!("dropped collection '{collection}'"));
        Ok(())
    }

    /// Removes every collection.
    pub fn drop_all(&mut self) -> CoreResult<()> {
        self.store.drop_all();
        self.flush()?;
        self.notice("dropped all collections");
        Ok(())
    }

    /// Moves a collection, with all records in order, to a new name.
    ///
    /// # Errors
    ///
    /// `CollectionNotFound` if `old` is absent, `CollectionExists` if
    /// `new` is already taken.
    pub fn rename_collection(&mut self, old: &str, new: &str) -> CoreResult<()> {
        self.store.rename(old, new)?;
        if let Some(schema) = self.schemas.remove(old) {
            self.schemas.insert(new.to_string(), schema);
        }
        if let Some(defaults) = self.defaults.remove(old) {
            self.defaults.insert(new.to_string(), defaults);
        }
        self.flush()?;
        self.notice(format!("renamed collection '{old}' to '{new}'"));
        Ok(())
    }

    /// Deep-copies a collection's records under a new name.
    pub fn clone_collection(&mut self, from: &str, to: &str) -> CoreResult<()> {
        self.store.clone_collection(from, to)?;
        self.flush()?;
        self.notice(format!("cloned collection '{from}' to '{to}'"));
        Ok(())
    }

    // ========================================================================
    // Queries and reads
    // ========================================================================

    /// Returns the records matching a condition string, in store order.
    ///
    /// An empty condition matches everything. Any parse or evaluation
    /// failure aborts the whole call with a single
    /// `ConditionEvaluationFailed` naming the condition; there are no
    /// partial results.
    pub fn query(&self, collection: &str, condition: &str) -> CoreResult<Vec<Record>> {
        let records = self.store.records(collection)?;
        let parsed = Condition::parse(condition)
            .map_err(|e| CoreError::condition_failed(condition, e.to_string()))?;

        let mut matches = Vec::new();
        for record in records {
            let hit = parsed
                .matches(record)
                .map_err(|e| CoreError::condition_failed(condition, e.to_string()))?;
            if hit {
                matches.push(record.clone());
            }
        }
        Ok(matches)
    }

    /// Returns the records for which `predicate` returns `Ok(true)`.
    ///
    /// A predicate failure excludes the record; it never aborts the call.
    pub fn filter<F, E>(&self, collection: &str, mut predicate: F) -> CoreResult<Vec<Record>>
    where
        F: FnMut(&Record) -> Result<bool, E>,
    {
        let records = self.store.records(collection)?;
        Ok(records
            .iter()
            .filter(|record| predicate(record).unwrap_or(false))
            .cloned()
            .collect())
    }

    /// Returns the records whose field `key` contains `term` as a
    /// substring of its string form.
    ///
    /// Compatibility quirk, kept deliberately: matching is always
    /// case-insensitive, whatever `ignore_case` says.
    ///
    /// # Errors
    ///
    /// `CollectionNotFound`; `KeyNotFound` if no record has the key.
    pub fn search(
        &self,
        collection: &str,
        key: &str,
        term: &str,
        ignore_case: bool,
    ) -> CoreResult<Vec<Record>> {
        let _ = ignore_case;
        let records = self.store.records(collection)?;
        if !records.iter().any(|r| r.contains_key(key)) {
            return Err(CoreError::key_not_found(collection, key));
        }
        let needle = term.to_lowercase();
        Ok(records
            .iter()
            .filter(|r| {
                r.get(key)
                    .is_some_and(|v| record::stringify(v).to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    /// Returns the records whose field `key` equals `value`, in store
    /// order.
    ///
    /// A lookup that matches nothing is an ordinary empty result, not an
    /// error; only a missing collection or a key absent from every
    /// record is.
    pub fn find(&self, collection: &str, key: &str, value: &Value) -> CoreResult<Vec<Record>> {
        let indices = self.store.find_indices(collection, key, value)?;
        if indices.is_empty() {
            self.notice(format!(
                "no record in '{collection}' matches {key} == {value}"
            ));
            return Ok(Vec::new());
        }
        let records = self.store.records(collection)?;
        Ok(indices.into_iter().map(|i| records[i].clone()).collect())
    }

    /// Number of records in a collection.
    pub fn count(&self, collection: &str) -> CoreResult<usize> {
        Ok(self.store.records(collection)?.len())
    }

    /// Names of all collections.
    #[must_use]
    pub fn list_collections(&self) -> Vec<String> {
        self.store.names()
    }

    /// Whether the named collection exists (possibly empty).
    #[must_use]
    pub fn exists_collection(&self, collection: &str) -> bool {
        self.store.contains(collection)
    }

    /// Whether any record in the collection has the field `key`.
    pub fn exists_key(&self, collection: &str, key: &str) -> CoreResult<bool> {
        Ok(self
            .store
            .records(collection)?
            .iter()
            .any(|r| r.contains_key(key)))
    }

    /// Whether any record's field `key` equals `value`.
    ///
    /// An absent key is simply `false`; only a missing collection errors.
    pub fn exists_value(&self, collection: &str, key: &str, value: &Value) -> CoreResult<bool> {
        Ok(self
            .store
            .records(collection)?
            .iter()
            .any(|r| r.get(key).is_some_and(|v| record::values_equal(v, value))))
    }

    /// Union of field names across all records, in first-seen order.
    pub fn list_keys(&self, collection: &str) -> CoreResult<Vec<String>> {
        let records = self.store.records(collection)?;
        let mut keys: Vec<String> = Vec::new();
        for record in records {
            for field in record.keys() {
                if !keys.iter().any(|k| k == field) {
                    keys.push(field.clone());
                }
            }
        }
        Ok(keys)
    }

    /// Distinct values of `key` with their occurrence counts, in
    /// first-seen order.
    ///
    /// # Errors
    ///
    /// `CollectionNotFound`; `KeyNotFound` if no record has the key.
    pub fn count_values(&self, collection: &str, key: &str) -> CoreResult<Vec<(Value, usize)>> {
        let records = self.store.records(collection)?;
        if !records.iter().any(|r| r.contains_key(key)) {
            return Err(CoreError::key_not_found(collection, key));
        }
        let mut counts: Vec<(Value, usize)> = Vec::new();
        for value in records.iter().filter_map(|r| r.get(key)) {
            match counts
                .iter_mut()
                .find(|(seen, _)| record::values_equal(seen, value))
            {
                Some((_, count)) => *count += 1,
                None => counts.push((value.clone(), 1)),
            }
        }
        Ok(counts)
    }

    /// All records of a collection, in store order.
    pub fn records(&self, collection: &str) -> CoreResult<Vec<Record>> {
        Ok(self.store.records(collection)?.clone())
    }

    /// The values of `key` across a collection's records, in store
    /// order. Records lacking the key are skipped.
    ///
    /// # Errors
    ///
    /// `CollectionNotFound`; `KeyNotFound` if no record has the key.
    pub fn field_values(&self, collection: &str, key: &str) -> CoreResult<Vec<Value>> {
        let records = self.store.records(collection)?;
        if !records.iter().any(|r| r.contains_key(key)) {
            return Err(CoreError::key_not_found(collection, key));
        }
        Ok(records.iter().filter_map(|r| r.get(key)).cloned().collect())
    }

    // ========================================================================
    // Schemas and defaults
    // ========================================================================

    /// Binds a schema to a collection.
    ///
    /// Subsequent inserts and updates into the collection are validated
    /// against it. An empty schema removes validation, same as
    /// [`Database::clear_schema`].
    pub fn set_schema(&mut self, collection: impl Into<String>, schema: Schema) {
        let name = collection.into();
        if schema.is_empty() {
            self.schemas.remove(&name);
        } else {
            self.schemas.insert(name, schema);
        }
    }

    /// Removes a collection's schema, if any.
    pub fn clear_schema(&mut self, collection: &str) {
        self.schemas.remove(collection);
    }

    /// Registers default field values applied on insert into a
    /// collection. Caller-specified fields always win.
    pub fn set_default_values(&mut self, collection: impl Into<String>, defaults: Record) {
        self.defaults.insert(collection.into(), defaults);
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// The current commit mode.
    #[must_use]
    pub fn commit_mode(&self) -> CommitMode {
        self.persistence.mode()
    }

    /// Switches between auto-commit and manual commit.
    ///
    /// Takes effect for subsequent operations only; nothing already
    /// applied is retroactively flushed or withheld.
    pub fn set_auto_commit(&mut self, auto_commit: bool) {
        self.persistence.set_mode(if auto_commit {
            CommitMode::Auto
        } else {
            CommitMode::Manual
        });
    }

    /// Writes current in-memory state to the backing document now.
    ///
    /// This is the explicit flush for manual mode; in auto-commit mode it
    /// simply rewrites the file with the state it already reflects.
    pub fn commit(&mut self) -> CoreResult<()> {
        self.persistence.commit(self.store.as_map())?;
        self.notice("committed database to backing file");
        Ok(())
    }

    /// Serializes current state to `path` without touching the backing
    /// file or in-memory state.
    pub fn backup(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        self.persistence.backup(path.as_ref(), self.store.as_map())?;
        self.notice(format!("backed up database to {}", path.as_ref().display()));
        Ok(())
    }

    /// Fully replaces in-memory state with the contents of the JSON file
    /// at `path`.
    ///
    /// Under auto-commit the restored state is immediately persisted back
    /// to the original backing path.
    ///
    /// # Errors
    ///
    /// `BackupFileNotFound` if `path` does not exist; `InvalidFileType`
    /// if it is not a `.json` path.
    pub fn restore(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let collections = self.persistence.read_backup(path.as_ref())?;
        self.store.replace(collections);
        self.flush()?;
        self.notice(format!(
            "restored database from {}",
            path.as_ref().display()
        ));
        Ok(())
    }

    /// The backing file path, or `None` for a transient database.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.persistence.path()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Shape-checks a record, merges collection defaults, and
    /// schema-validates the result.
    fn prepare(&self, collection: &str, record: Value) -> CoreResult<Record> {
        let mut record = record::into_record(record)?;
        if let Some(defaults) = self.defaults.get(collection) {
            for (field, value) in defaults {
                if !record.contains_key(field) {
                    record.insert(field.clone(), value.clone());
                }
            }
        }
        self.check_schema(collection, &record)?;
        Ok(record)
    }

    fn check_schema(&self, collection: &str, record: &Record) -> CoreResult<()> {
        if let Some(schema) = self.schemas.get(collection) {
            let failures = schema.validate(record);
            if !failures.is_empty() {
                return Err(CoreError::SchemaValidationFailed {
                    collection: collection.to_string(),
                    failures,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> CoreResult<()> {
        self.persistence.flush(self.store.as_map())
    }

    pub(crate) fn store(&self) -> &RecordStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }

    fn notice(&self, message: impl AsRef<str>) {
        if self.verbose {
            tracing::info!(target: "shelfdb", "{}", message.as_ref());
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("collections", &self.store.names())
            .field("commit_mode", &self.commit_mode())
            .field("file_path", &self.file_path())
            .finish_non_exhaustive()
    }
}
