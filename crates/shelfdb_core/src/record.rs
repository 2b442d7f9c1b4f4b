//! Record shape and the loose value comparison shared by lookups and the
//! condition evaluator.

use crate::error::{CoreError, CoreResult};
use serde_json::Value;
use std::cmp::Ordering;

/// A single record: an insertion-ordered field map from field name to a
/// JSON-compatible value.
///
/// Records have no implicit primary key; callers locate records by a
/// `(key, value)` pair, and several records may match.
pub type Record = serde_json::Map<String, Value>;

/// Checks a caller-supplied value and converts it into a [`Record`].
///
/// A record must be a JSON object with at least one field, and every
/// field name must be non-empty.
pub(crate) fn into_record(value: Value) -> CoreResult<Record> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(CoreError::invalid_record(format!(
                "expected a field map, got {}",
                type_name(&other)
            )))
        }
    };
    if map.is_empty() {
        return Err(CoreError::invalid_record("record has no fields"));
    }
    if map.keys().any(String::is_empty) {
        return Err(CoreError::invalid_record("record has an empty field name"));
    }
    Ok(map)
}

/// Shallow-merges `patch` into `base`: patch fields overwrite, fields the
/// patch does not mention are left untouched.
pub(crate) fn merge(base: &mut Record, patch: &Record) {
    for (field, value) in patch {
        base.insert(field.clone(), value.clone());
    }
}

/// Human-readable JSON type name for diagnostics.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Numeric view of a value: JSON numbers, and strings that parse as
/// finite numbers. `"NaN"` and `"inf"` stay strings so they compare
/// under string equality.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// String view of a value. Strings are taken verbatim; everything else
/// uses its JSON text form.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Loose equality: numeric when both sides are numbers (or number-like
/// strings), string equality otherwise.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x == y;
    }
    stringify(a) == stringify(b)
}

/// Loose ordering: numeric when both sides are numeric, lexicographic
/// on the string forms otherwise.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    stringify(a).cmp(&stringify(b))
}
