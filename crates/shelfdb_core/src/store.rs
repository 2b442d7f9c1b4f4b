//! In-memory record store.
//!
//! The store owns the collection map and every structural primitive over
//! it. It knows nothing about schemas, defaults, or persistence; the
//! [`crate::Database`] façade layers those on top.

use crate::error::{CoreError, CoreResult};
use crate::record::{values_equal, Record};
use serde_json::Value;
use std::collections::BTreeMap;

/// The collection map: collection name to ordered record sequence.
pub(crate) type Collections = BTreeMap<String, Vec<Record>>;

/// In-memory mapping of collection name to ordered records.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordStore {
    collections: Collections,
}

impl RecordStore {
    /// Creates an empty store.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates a store from an already-validated collection map.
    pub(crate) fn from_collections(collections: Collections) -> Self {
        Self { collections }
    }

    /// Creates an empty collection if absent. Idempotent.
    pub(crate) fn ensure_collection(&mut self, name: &str) {
        if !self.collections.contains_key(name) {
            tracing::debug!(collection = name, "creating collection");
            self.collections.insert(name.to_string(), Vec::new());
        }
    }

    /// Whether the named collection exists (possibly empty).
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// The records of a collection, or `CollectionNotFound`.
    pub(crate) fn records(&self, name: &str) -> CoreResult<&Vec<Record>> {
        self.collections
            .get(name)
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    fn records_mut(&mut self, name: &str) -> CoreResult<&mut Vec<Record>> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    /// Appends a record to the end of a collection's sequence.
    ///
    /// The collection must already exist (callers go through
    /// [`Self::ensure_collection`] first when auto-creation is wanted).
    pub(crate) fn append(&mut self, name: &str, record: Record) -> CoreResult<()> {
        self.records_mut(name)?.push(record);
        Ok(())
    }

    /// Positions of records whose field `key` loosely equals `value`.
    ///
    /// Fails with `CollectionNotFound` if the collection is absent and
    /// with `KeyNotFound` if no record in the collection has the key at
    /// all. Zero value matches with the key present is `Ok(vec![])`.
    pub(crate) fn find_indices(
        &self,
        name: &str,
        key: &str,
        value: &Value,
    ) -> CoreResult<Vec<usize>> {
        let records = self.records(name)?;
        if !records.iter().any(|r| r.contains_key(key)) {
            return Err(CoreError::key_not_found(name, key));
        }
        Ok(records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.get(key).is_some_and(|v| values_equal(v, value)))
            .map(|(i, _)| i)
            .collect())
    }

    /// Replaces the records at the given positions.
    ///
    /// Positions must come from [`Self::find_indices`] on the same
    /// unmodified collection.
    pub(crate) fn replace_at(
        &mut self,
        name: &str,
        replacements: Vec<(usize, Record)>,
    ) -> CoreResult<()> {
        let records = self.records_mut(name)?;
        for (index, record) in replacements {
            records[index] = record;
        }
        Ok(())
    }

    /// Removes the records at the given positions.
    pub(crate) fn remove_at(&mut self, name: &str, mut indices: Vec<usize>) -> CoreResult<usize> {
        let records = self.records_mut(name)?;
        indices.sort_unstable();
        for index in indices.iter().rev() {
            records.remove(*index);
        }
        Ok(indices.len())
    }

    /// Empties a collection in place, keeping it present.
    pub(crate) fn clear(&mut self, name: &str) -> CoreResult<()> {
        self.records_mut(name)?.clear();
        Ok(())
    }

    /// Removes a collection entirely.
    pub(crate) fn drop_collection(&mut self, name: &str) -> CoreResult<()> {
        self.collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    /// Removes every collection.
    pub(crate) fn drop_all(&mut self) {
        self.collections.clear();
    }

    /// Moves a collection, with all records in order, to a new name.
    pub(crate) fn rename(&mut self, old: &str, new: &str) -> CoreResult<()> {
        if !self.collections.contains_key(old) {
            return Err(CoreError::collection_not_found(old));
        }
        if self.collections.contains_key(new) {
            return Err(CoreError::collection_exists(new));
        }
        // Checked above, so the remove cannot miss.
        if let Some(records) = self.collections.remove(old) {
            self.collections.insert(new.to_string(), records);
        }
        Ok(())
    }

    /// Deep-copies a collection's records under a new name.
    pub(crate) fn clone_collection(&mut self, from: &str, to: &str) -> CoreResult<()> {
        if self.collections.contains_key(to) {
            return Err(CoreError::collection_exists(to));
        }
        let copied = self.records(from)?.clone();
        self.collections.insert(to.to_string(), copied);
        Ok(())
    }

    /// All collection names.
    pub(crate) fn names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    /// Borrow of the full collection map, for serialization.
    pub(crate) fn as_map(&self) -> &Collections {
        &self.collections
    }

    /// Deep copy of the full collection map, for transaction snapshots.
    pub(crate) fn snapshot(&self) -> Collections {
        self.collections.clone()
    }

    /// Fully replaces in-memory state (restore, rollback).
    pub(crate) fn replace(&mut self, collections: Collections) {
        self.collections = collections;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test records must be objects"),
        }
    }

    fn store_with_users() -> RecordStore {
        let mut store = RecordStore::new();
        store.ensure_collection("users");
        store
            .append("users", record(json!({"id": 1, "name": "ada"})))
            .unwrap();
        store
            .append("users", record(json!({"id": 2, "name": "grace"})))
            .unwrap();
        store
            .append("users", record(json!({"id": 3, "name": "ada"})))
            .unwrap();
        store
    }

    #[test]
    fn ensure_collection_is_idempotent() {
        let mut store = store_with_users();
        store.ensure_collection("users");
        assert_eq!(store.records("users").unwrap().len(), 3);
    }

    #[test]
    fn empty_collection_is_distinct_from_absent() {
        let mut store = store_with_users();
        store.clear("users").unwrap();
        assert!(store.contains("users"));
        assert!(store.records("users").unwrap().is_empty());

        store.drop_collection("users").unwrap();
        assert!(!store.contains("users"));
        assert!(matches!(
            store.records("users"),
            Err(CoreError::CollectionNotFound { .. })
        ));
    }

    #[test]
    fn find_indices_in_store_order() {
        let store = store_with_users();
        let indices = store.find_indices("users", "name", &json!("ada")).unwrap();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn find_indices_key_absent_everywhere() {
        let store = store_with_users();
        assert!(matches!(
            store.find_indices("users", "email", &json!("x")),
            Err(CoreError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn find_indices_no_value_match_is_empty_not_error() {
        let store = store_with_users();
        let indices = store.find_indices("users", "id", &json!(99)).unwrap();
        assert!(indices.is_empty());
    }

    #[test]
    fn remove_at_handles_multiple_indices() {
        let mut store = store_with_users();
        let removed = store.remove_at("users", vec![0, 2]).unwrap();
        assert_eq!(removed, 2);
        let remaining = store.records("users").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].get("id"), Some(&json!(2)));
    }

    #[test]
    fn rename_preserves_records_and_frees_old_name() {
        let mut store = store_with_users();
        store.rename("users", "people").unwrap();
        assert!(!store.contains("users"));
        assert_eq!(store.records("people").unwrap().len(), 3);
    }

    #[test]
    fn rename_to_taken_name_fails() {
        let mut store = store_with_users();
        store.ensure_collection("people");
        assert!(matches!(
            store.rename("users", "people"),
            Err(CoreError::CollectionExists { .. })
        ));
    }

    #[test]
    fn rename_missing_source_fails() {
        let mut store = RecordStore::new();
        assert!(matches!(
            store.rename("ghost", "people"),
            Err(CoreError::CollectionNotFound { .. })
        ));
    }

    #[test]
    fn clone_collection_is_a_deep_copy() {
        let mut store = store_with_users();
        store.clone_collection("users", "users_copy").unwrap();

        store
            .append("users", record(json!({"id": 4, "name": "joan"})))
            .unwrap();
        assert_eq!(store.records("users").unwrap().len(), 4);
        assert_eq!(store.records("users_copy").unwrap().len(), 3);
    }

    #[test]
    fn snapshot_and_replace_round_trip() {
        let mut store = store_with_users();
        let snapshot = store.snapshot();

        store.drop_all();
        assert!(store.names().is_empty());

        store.replace(snapshot);
        assert_eq!(store.records("users").unwrap().len(), 3);
    }
}
