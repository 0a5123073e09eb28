//! Field-level before/after deltas.
//!
//! A diff is stored as a JSON object mapping each changed field to an
//! `{"old": ..., "new": ...}` pair. Fields are kept in lexicographic order
//! so that rendering is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while decoding a stored diff.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The stored bytes are not a diff object.
    #[error("malformed diff: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Old and new value of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDelta {
    /// Value before the mutation.
    #[serde(default)]
    pub old: Value,
    /// Value after the mutation.
    #[serde(default)]
    pub new: Value,
}

/// A structured delta keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diff(BTreeMap<String, FieldDelta>);

impl Diff {
    /// Drop the given fields from the delta.
    pub fn without(mut self, fields: &[&str]) -> Self {
        self.0.retain(|k, _| !fields.contains(&k.as_str()));
        self
    }

    /// Whether no field changed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of changed fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Delta of one field, if it changed.
    pub fn get(&self, field: &str) -> Option<&FieldDelta> {
        self.0.get(field)
    }

    /// Encode for storage.
    pub fn to_value(&self) -> Value {
        let map = self
            .0
            .iter()
            .map(|(field, delta)| {
                let mut pair = serde_json::Map::with_capacity(2);
                pair.insert("old".into(), delta.old.clone());
                pair.insert("new".into(), delta.new.clone());
                (field.clone(), Value::Object(pair))
            })
            .collect();
        Value::Object(map)
    }

    /// Flatten into ordered changes.
    pub fn into_changes(self) -> Vec<FieldChange> {
        self.0
            .into_iter()
            .map(|(field, delta)| FieldChange {
                field,
                old_value: delta.old,
                new_value: delta.new,
            })
            .collect()
    }
}

/// One changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field name.
    pub field: String,
    /// Value before the mutation.
    pub old_value: Value,
    /// Value after the mutation.
    pub new_value: Value,
}

/// Compute the delta between two record snapshots.
///
/// Either side may be `null` (insert or delete), in which case every field
/// of the other side is reported. Only fields whose values differ are
/// included.
pub fn compute_diff(old: &Value, new: &Value) -> Diff {
    let empty = serde_json::Map::new();
    let old = old.as_object().unwrap_or(&empty);
    let new = new.as_object().unwrap_or(&empty);

    let mut out = BTreeMap::new();
    for field in old.keys().chain(new.keys()) {
        if out.contains_key(field) {
            continue;
        }
        let before = old.get(field).cloned().unwrap_or(Value::Null);
        let after = new.get(field).cloned().unwrap_or(Value::Null);
        if before != after {
            out.insert(
                field.clone(),
                FieldDelta {
                    old: before,
                    new: after,
                },
            );
        }
    }
    Diff(out)
}

/// Parse a stored diff. Empty input and `null` yield no changes.
pub fn parse_diff(raw: &[u8]) -> Result<Vec<FieldChange>, DiffError> {
    let trimmed = raw.trim_ascii();
    if trimmed.is_empty() || trimmed == b"null" {
        return Ok(Vec::new());
    }
    let diff: Diff = serde_json::from_slice(trimmed)?;
    Ok(diff.into_changes())
}

/// Parse a diff that has already been decoded as JSON.
pub fn parse_diff_value(value: &Value) -> Result<Vec<FieldChange>, DiffError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let diff = Diff::deserialize(value)?;
    Ok(diff.into_changes())
}

/// Render changes as `field: old -> new` pairs joined by `; `.
pub fn render_changes(changes: &[FieldChange]) -> String {
    changes
        .iter()
        .map(|c| {
            format!(
                "{}: {} -> {}",
                c.field,
                render_value(&c.old_value),
                render_value(&c.new_value)
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Human-readable rendering of a stored diff.
///
/// Falls back to the raw JSON text when the stored value cannot be
/// decoded, and to an empty string when there is no diff.
pub fn render_diff(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match parse_diff_value(value) {
        Ok(changes) => render_changes(&changes),
        Err(_) => value.to_string(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compute_then_parse_two_changes() {
        let old = json!({"name": "Laptop", "price": 999, "sku": "LAP-001"});
        let new = json!({"name": "Gaming Laptop", "price": 1299, "sku": "LAP-001"});

        let stored = serde_json::to_vec(&compute_diff(&old, &new).to_value()).unwrap();
        let changes = parse_diff(&stored).unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, "name");
        assert_eq!(changes[0].old_value, json!("Laptop"));
        assert_eq!(changes[0].new_value, json!("Gaming Laptop"));
        assert_eq!(changes[1].field, "price");
        assert_eq!(changes[1].old_value, json!(999));
        assert_eq!(changes[1].new_value, json!(1299));
    }

    #[test]
    fn test_identical_records_have_empty_diff() {
        let row = json!({"name": "Laptop", "quantity": 3});
        assert!(compute_diff(&row, &row).is_empty());
    }

    #[test]
    fn test_delete_reports_old_values() {
        let old = json!({"name": "Laptop"});
        let diff = compute_diff(&old, &Value::Null);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.get("name").unwrap().new, Value::Null);
    }

    #[test]
    fn test_parse_empty_and_null() {
        assert!(parse_diff(b"").unwrap().is_empty());
        assert!(parse_diff(b"null").unwrap().is_empty());
        assert!(parse_diff(b"  null\n").unwrap().is_empty());
        assert!(parse_diff_value(&Value::Null).unwrap().is_empty());
        assert!(parse_diff(b"{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_diff(b"not json").is_err());
        assert!(parse_diff(b"[1, 2, 3]").is_err());
        assert!(parse_diff_value(&json!({"name": "flat"})).is_err());
    }

    #[test]
    fn test_render_is_sorted_by_field() {
        let diff = json!({
            "quantity": {"old": 5, "new": 3},
            "name": {"old": "Laptop", "new": "Gaming Laptop"}
        });
        assert_eq!(
            render_diff(Some(&diff)),
            "name: Laptop -> Gaming Laptop; quantity: 5 -> 3"
        );
    }

    #[test]
    fn test_render_fallbacks() {
        assert_eq!(render_diff(None), "");
        assert_eq!(render_diff(Some(&Value::Null)), "");
        let odd = json!(["not", "a", "diff"]);
        assert_eq!(render_diff(Some(&odd)), odd.to_string());
    }

    #[test]
    fn test_render_null_values() {
        let diff = json!({"location": {"old": null, "new": "A-1"}});
        assert_eq!(render_diff(Some(&diff)), "location: null -> A-1");
    }
}
