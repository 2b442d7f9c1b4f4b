//! Per-collection record validation.
//!
//! A schema maps field names to rules. A field with a typed or predicate
//! rule is required: its absence is a failure. A field with [`Rule::Any`]
//! is a recognized, optional field accepted without a check. Fields the
//! schema does not mention are unrestricted.

use crate::record::{type_name, Record};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A validation predicate over a candidate field value.
pub type FieldPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Primitive JSON type tags for typed rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A JSON number.
    Number,
    /// A JSON string.
    String,
    /// A JSON boolean.
    Bool,
    /// A JSON array.
    Array,
    /// A nested JSON object.
    Object,
}

impl FieldType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => f.write_str("a number"),
            Self::String => f.write_str("a string"),
            Self::Bool => f.write_str("a boolean"),
            Self::Array => f.write_str("an array"),
            Self::Object => f.write_str("an object"),
        }
    }
}

/// A validation rule for one field.
#[derive(Clone)]
pub enum Rule {
    /// The field is required and must have the given JSON type.
    Type(FieldType),
    /// The field is required and must satisfy the predicate.
    Predicate(FieldPredicate),
    /// The field is recognized but optional and unchecked (the "null rule").
    Any,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(t) => write!(f, "Type({t:?})"),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Any => f.write_str("Any"),
        }
    }
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidationFailure {
    /// The field the failure is about.
    pub field: String,
    /// What went wrong.
    pub reason: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.field, self.reason)
    }
}

/// A set of validation rules for one collection.
///
/// # Example
///
/// ```rust
/// use shelfdb_core::{FieldType, Schema};
///
/// let schema = Schema::new()
///     .field("id", FieldType::Number)
///     .check("email", |v| v.as_str().is_some_and(|s| s.contains('@')))
///     .optional("nickname");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: BTreeMap<String, Rule>,
}

impl Schema {
    /// Creates an empty schema (validates nothing).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required, typed field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.rules.insert(name.into(), Rule::Type(field_type));
        self
    }

    /// Adds a required field validated by a predicate.
    #[must_use]
    pub fn check<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.rules
            .insert(name.into(), Rule::Predicate(Arc::new(predicate)));
        self
    }

    /// Adds an optional, unchecked field.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.rules.insert(name.into(), Rule::Any);
        self
    }

    /// Whether the schema has no rules at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validates a record, returning every field-level failure.
    ///
    /// An empty result means the record is acceptable.
    #[must_use]
    pub fn validate(&self, record: &Record) -> Vec<ValidationFailure> {
        let mut failures = Vec::new();
        for (field, rule) in &self.rules {
            match (record.get(field), rule) {
                (None, Rule::Any) => {}
                (None, _) => failures.push(ValidationFailure {
                    field: field.clone(),
                    reason: "missing required field".to_string(),
                }),
                (Some(_), Rule::Any) => {}
                (Some(value), Rule::Type(expected)) => {
                    if !expected.accepts(value) {
                        failures.push(ValidationFailure {
                            field: field.clone(),
                            reason: format!("expected {expected}, got {}", type_name(value)),
                        });
                    }
                }
                (Some(value), Rule::Predicate(predicate)) => {
                    if !predicate(value) {
                        failures.push(ValidationFailure {
                            field: field.clone(),
                            reason: "predicate rejected the value".to_string(),
                        });
                    }
                }
            }
        }
        failures
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

    #[test]
    fn empty_schema_accepts_anything() {
        let schema = Schema::new();
        assert!(schema.is_empty());
        assert!(schema.validate(&record(json!({"x": 1}))).is_empty());
    }

    #[test]
    fn typed_field_mismatch() {
        let schema = Schema::new().field("id", FieldType::Number);
        let failures = schema.validate(&record(json!({"id": "1"})));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field, "id");
        assert!(failures[0].reason.contains("expected a number"));
    }

    #[test]
    fn typed_field_accepted() {
        let schema = Schema::new()
            .field("id", FieldType::Number)
            .field("name", FieldType::String)
            .field("tags", FieldType::Array);
        let failures = schema.validate(&record(json!({
            "id": 1, "name": "ada", "tags": []
        })));
        assert!(failures.is_empty());
    }

    #[test]
    fn required_field_missing() {
        let schema = Schema::new().field("id", FieldType::Number);
        let failures = schema.validate(&record(json!({"name": "ada"})));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].reason, "missing required field");
    }

    #[test]
    fn optional_field_may_be_absent_or_anything() {
        let schema = Schema::new().optional("nickname");
        assert!(schema.validate(&record(json!({"x": 1}))).is_empty());
        assert!(schema.validate(&record(json!({"nickname": 42}))).is_empty());
    }

    #[test]
    fn predicate_rule() {
        let schema = Schema::new().check("age", |v| v.as_i64().is_some_and(|n| n >= 0));
        assert!(schema.validate(&record(json!({"age": 30}))).is_empty());

        let failures = schema.validate(&record(json!({"age": -1})));
        assert_eq!(failures.len(), 1);
        assert!(failures[0].reason.contains("predicate"));
    }

    #[test]
    fn reports_every_failure() {
        let schema = Schema::new()
            .field("id", FieldType::Number)
            .field("name", FieldType::String);
        let failures = schema.validate(&record(json!({"id": "x", "extra": true})));
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn unlisted_fields_are_unrestricted() {
        let schema = Schema::new().field("id", FieldType::Number);
        assert!(schema
            .validate(&record(json!({"id": 1, "whatever": [1, 2]})))
            .is_empty());
    }
}
