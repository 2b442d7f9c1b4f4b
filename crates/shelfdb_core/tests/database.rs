//! End-to-end behavior of the public API.

use serde_json::json;
use shelfdb_core::{Config, CoreError, Database, FieldType, Schema};
use tempfile::tempdir;

#[test]
fn inserted_records_are_visible_through_find() {
    let mut db = Database::open_in_memory().unwrap();
    db.insert("users", json!({"id": 7, "name": "ada", "tags": ["math"]}))
        .unwrap();

    let found = db.find("users", "id", &json!(7)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("tags"), Some(&json!(["math"])));

    let found = db.find("users", "name", &json!("ada")).unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn delete_then_find_is_empty() {
    let mut db = Database::open_in_memory().unwrap();
    db.bulk_insert("users", vec![json!({"id": 1}), json!({"id": 2})])
        .unwrap();

    db.delete("users", "id", &json!(1)).unwrap();
    assert!(db.find("users", "id", &json!(1)).unwrap().is_empty());

    // Once no record carries the key at all, the lookup is a key error.
    db.delete("users", "id", &json!(2)).unwrap();
    assert!(matches!(
        db.find("users", "id", &json!(1)),
        Err(CoreError::KeyNotFound { .. })
    ));
}

#[test]
fn update_never_drops_unmentioned_fields() {
    let mut db = Database::open_in_memory().unwrap();
    db.insert("items", json!({"a": 1, "b": 2})).unwrap();
    db.update("items", "a", &json!(1), json!({"b": 3})).unwrap();

    let records = db.records("items").unwrap();
    assert_eq!(records[0].get("a"), Some(&json!(1)));
    assert_eq!(records[0].get("b"), Some(&json!(3)));
}

#[test]
fn backup_restore_reproduces_the_exact_state() {
    let dir = tempdir().unwrap();
    let backup = dir.path().join("backup.json");

    let mut db = Database::open_in_memory().unwrap();
    db.bulk_insert(
        "posts",
        vec![
            json!({"id": 1, "title": "A", "views": 100}),
            json!({"id": 2, "title": "B", "views": 250}),
        ],
    )
    .unwrap();
    db.insert("users", json!({"id": 1, "name": "ada"})).unwrap();
    let before = db.records("posts").unwrap();

    db.backup(&backup).unwrap();
    db.drop_all().unwrap();
    db.restore(&backup).unwrap();

    assert_eq!(db.records("posts").unwrap(), before);
    assert_eq!(db.count("users").unwrap(), 1);
}

#[test]
fn transaction_atomicity_on_failure_and_success() {
    let mut db = Database::open_in_memory().unwrap();
    db.insert("users", json!({"id": 1})).unwrap();
    let before = db.count("users").unwrap();

    let result = db.transaction(|db| {
        db.insert("users", json!({"id": 2}))?;
        db.insert("users", json!({"id": 3}))?;
        db.delete("users", "id", &json!(999))?; // NoMatch, aborts the body
        Ok(())
    });
    assert!(matches!(result, Err(CoreError::TransactionFailed { .. })));
    assert_eq!(db.count("users").unwrap(), before);

    db.transaction(|db| {
        db.insert("users", json!({"id": 2}))?;
        db.insert("users", json!({"id": 3}))?;
        Ok(())
    })
    .unwrap();
    assert_eq!(db.count("users").unwrap(), before + 2);
}

#[test]
fn rename_preserves_records_and_frees_the_old_name() {
    let mut db = Database::open_in_memory().unwrap();
    db.bulk_insert("users", vec![json!({"id": 1}), json!({"id": 2})])
        .unwrap();
    let before = db.records("users").unwrap();

    db.rename_collection("users", "people").unwrap();

    assert!(!db.exists_collection("users"));
    assert!(db.exists_collection("people"));
    assert_eq!(db.records("people").unwrap(), before);

    assert!(matches!(
        db.rename_collection("people", "people"),
        Err(CoreError::CollectionExists { .. })
    ));
}

#[test]
fn query_scenario_from_the_posts_collection() {
    let mut db = Database::open_in_memory().unwrap();
    db.insert("posts", json!({"id": 1, "title": "A", "views": 100}))
        .unwrap();
    db.insert("posts", json!({"id": 2, "title": "B", "views": 250}))
        .unwrap();

    let hits = db.query("posts", "views > 200 & id == 2").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].get("id"), Some(&json!(2)));

    assert_eq!(db.query("posts", "").unwrap().len(), 2);

    match db.query("posts", "views >") {
        Err(CoreError::ConditionEvaluationFailed { condition, .. }) => {
            assert_eq!(condition, "views >");
        }
        other => panic!("expected ConditionEvaluationFailed, got {other:?}"),
    }
}

#[test]
fn list_keys_unions_field_names_in_first_seen_order() {
    let mut db = Database::open_in_memory().unwrap();
    db.bulk_insert(
        "users",
        vec![json!({"name": "Alice", "age": 30}), json!({"name": "Bob"})],
    )
    .unwrap();

    assert_eq!(db.list_keys("users").unwrap(), vec!["name", "age"]);
}

#[test]
fn schema_failure_rejects_the_insert_entirely() {
    let mut db = Database::open_in_memory().unwrap();
    db.set_schema("users", Schema::new().field("id", FieldType::Number));
    db.ensure_collection("users").unwrap();

    let result = db.insert("users", json!({"id": "1"}));
    match result {
        Err(CoreError::SchemaValidationFailed { failures, .. }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].field, "id");
        }
        other => panic!("expected SchemaValidationFailed, got {other:?}"),
    }
    assert_eq!(db.count("users").unwrap(), 0);
}

#[test]
fn state_survives_reopen_through_the_backing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db.json");

    {
        let mut db = Database::open(&path).unwrap();
        db.insert("users", json!({"id": 1, "name": "ada"})).unwrap();
        db.insert("posts", json!({"id": 1, "title": "A"})).unwrap();
        db.update("users", "id", &json!(1), json!({"name": "lovelace"}))
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(
        db.list_collections(),
        vec!["posts".to_string(), "users".to_string()]
    );
    let found = db.find("users", "name", &json!("lovelace")).unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn default_values_from_config_apply_on_insert() {
    let defaults = match json!({"active": true}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    let mut db = Database::open_in_memory_with_config(
        Config::new().default_values("users", defaults),
    )
    .unwrap();

    db.insert("users", json!({"id": 1})).unwrap();
    db.insert("users", json!({"id": 2, "active": false})).unwrap();

    assert!(db.exists_value("users", "active", &json!(true)).unwrap());
    let explicit = db.find("users", "id", &json!(2)).unwrap();
    assert_eq!(explicit[0].get("active"), Some(&json!(false)));
}

#[test]
fn clone_collection_copies_records_independently() {
    let mut db = Database::open_in_memory().unwrap();
    db.insert("users", json!({"id": 1})).unwrap();
    db.clone_collection("users", "archive").unwrap();

    db.insert("users", json!({"id": 2})).unwrap();
    assert_eq!(db.count("users").unwrap(), 2);
    assert_eq!(db.count("archive").unwrap(), 1);
}

#[test]
fn loose_equality_bridges_numbers_and_numeric_strings() {
    let mut db = Database::open_in_memory().unwrap();
    db.insert("items", json!({"code": "100"})).unwrap();

    // A numeric lookup matches the numeric string, per the evaluator's
    // comparison semantics.
    let found = db.find("items", "code", &json!(100)).unwrap();
    assert_eq!(found.len(), 1);
}
