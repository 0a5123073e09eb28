//! Audit log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use warehouse_core::types::{BindValue, Bound, FieldSource, QueryFilterBuilder, QueryPlan};
use warehouse_core::{AppError, AppResult};

use super::columns;
use super::diff::{self, FieldChange};

/// Kind of mutation an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    /// Item created.
    Insert,
    /// Item updated.
    Update,
    /// Item deleted.
    Delete,
}

impl AuditAction {
    /// Return the action as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(AppError::validation(format!(
                "Invalid audit action: '{s}'. Expected one of: INSERT, UPDATE, DELETE"
            ))),
        }
    }
}

/// An immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    /// Sequence identifier.
    pub id: i64,
    /// The item that was mutated.
    pub item_id: Uuid,
    /// What happened.
    pub action: AuditAction,
    /// The user who performed the mutation.
    pub changed_by: Uuid,
    /// Row state before the mutation (absent for inserts).
    pub old_data: Option<serde_json::Value>,
    /// Row state after the mutation (absent for deletes).
    pub new_data: Option<serde_json::Value>,
    /// Field-level delta, see [`diff`].
    pub diff: Option<serde_json::Value>,
    /// When the mutation happened.
    pub changed_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Parsed field changes of this entry.
    pub fn changes(&self) -> Result<Vec<FieldChange>, diff::DiffError> {
        match &self.diff {
            Some(value) => diff::parse_diff_value(value),
            None => Ok(Vec::new()),
        }
    }
}

/// An audit entry joined with the acting user's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditRecord {
    /// The entry itself.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: AuditEntry,
    /// Acting user's login name, `"unknown"` when that user is gone.
    pub username: String,
}

impl FieldSource for AuditRecord {
    fn field(&self, column: &str) -> Option<BindValue> {
        match column {
            columns::ITEM_ID => Some(BindValue::Uuid(self.entry.item_id)),
            columns::CHANGED_BY => Some(BindValue::Uuid(self.entry.changed_by)),
            columns::ACTION => Some(BindValue::Text(self.entry.action.as_str().to_string())),
            columns::CHANGED_AT => Some(BindValue::Timestamp(self.entry.changed_at)),
            _ => None,
        }
    }
}

/// Data written alongside an item mutation.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    /// The item that was mutated.
    pub item_id: Uuid,
    /// What happened.
    pub action: AuditAction,
    /// The acting user.
    pub changed_by: Uuid,
    /// Row state before the mutation.
    pub old_data: Option<serde_json::Value>,
    /// Row state after the mutation.
    pub new_data: Option<serde_json::Value>,
}

impl NewAuditEntry {
    /// Fields excluded from the recorded diff. They change on every write.
    pub const UNTRACKED_FIELDS: &'static [&'static str] = &["created_at", "updated_at"];

    /// Diff between the two snapshots, serialized for storage.
    pub fn diff(&self) -> serde_json::Value {
        let old = self.old_data.as_ref().unwrap_or(&serde_json::Value::Null);
        let new = self.new_data.as_ref().unwrap_or(&serde_json::Value::Null);
        diff::compute_diff(old, new)
            .without(Self::UNTRACKED_FIELDS)
            .to_value()
    }
}

/// Raw audit filter as received from a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Restrict to one item.
    pub item_id: Option<Uuid>,
    /// Restrict to one acting user.
    pub user_id: Option<Uuid>,
    /// Restrict to one action; must be `INSERT`, `UPDATE` or `DELETE`.
    pub action: Option<String>,
    /// Inclusive lower bound on the change time.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the change time.
    pub date_to: Option<DateTime<Utc>>,
}

impl AuditFilter {
    /// Validate the filter into typed criteria.
    pub fn parse(&self) -> AppResult<AuditCriteria> {
        let action = self
            .action
            .as_deref()
            .map(AuditAction::from_str)
            .transpose()?;
        Ok(AuditCriteria {
            item_id: self.item_id,
            user_id: self.user_id,
            action,
            date_from: self.date_from,
            date_to: self.date_to,
        })
    }
}

/// Validated audit filter criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditCriteria {
    /// Restrict to one item.
    pub item_id: Option<Uuid>,
    /// Restrict to one acting user.
    pub user_id: Option<Uuid>,
    /// Restrict to one action.
    pub action: Option<AuditAction>,
    /// Inclusive lower bound on the change time.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the change time.
    pub date_to: Option<DateTime<Utc>>,
}

impl AuditCriteria {
    /// Criteria selecting every entry of one item.
    pub fn for_item(item_id: Uuid) -> Self {
        Self {
            item_id: Some(item_id),
            ..Default::default()
        }
    }

    /// Render the criteria into a query plan bounded by `bound`.
    pub fn plan(&self, bound: Bound) -> QueryPlan {
        QueryFilterBuilder::new()
            .eq(columns::ITEM_ID, self.item_id)
            .eq(columns::CHANGED_BY, self.user_id)
            .eq(columns::ACTION, self.action.map(|a| a.as_str()))
            .range(columns::CHANGED_AT, self.date_from, self.date_to)
            .build(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warehouse_core::ErrorKind;

    #[test]
    fn test_action_parsing_is_closed_and_exact() {
        assert_eq!("INSERT".parse::<AuditAction>().unwrap(), AuditAction::Insert);
        assert_eq!("DELETE".parse::<AuditAction>().unwrap(), AuditAction::Delete);
        assert_eq!(
            "UPSERT".parse::<AuditAction>().unwrap_err().kind,
            ErrorKind::Validation
        );
        assert!("update".parse::<AuditAction>().is_err());
        assert!("".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_filter_with_unknown_action_rejected() {
        let filter = AuditFilter {
            action: Some("TRUNCATE".into()),
            ..Default::default()
        };
        assert_eq!(filter.parse().unwrap_err().kind, ErrorKind::Validation);
    }

    #[test]
    fn test_criteria_plan() {
        let item = Uuid::new_v4();
        let criteria = AuditFilter {
            item_id: Some(item),
            action: Some("UPDATE".into()),
            ..Default::default()
        }
        .parse()
        .unwrap();

        let plan = criteria.plan(Bound::Limit(10_000));
        assert_eq!(
            plan.where_clause(),
            "WHERE a.item_id = $1 AND a.action::text = $2"
        );
        assert_eq!(plan.params()[1], BindValue::Text("UPDATE".into()));
    }

    #[test]
    fn test_insert_diff_lists_new_fields_without_timestamps() {
        let entry = NewAuditEntry {
            item_id: Uuid::new_v4(),
            action: AuditAction::Insert,
            changed_by: Uuid::new_v4(),
            old_data: None,
            new_data: Some(serde_json::json!({
                "name": "Laptop",
                "quantity": 3,
                "updated_at": "2024-01-01T00:00:00Z"
            })),
        };
        let diff = entry.diff();
        assert_eq!(diff["name"]["old"], serde_json::Value::Null);
        assert_eq!(diff["name"]["new"], "Laptop");
        assert!(diff.get("updated_at").is_none());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = AuditRecord {
            entry: AuditEntry {
                id: 7,
                item_id: Uuid::nil(),
                action: AuditAction::Delete,
                changed_by: Uuid::nil(),
                old_data: None,
                new_data: None,
                diff: None,
                changed_at: Utc::now(),
            },
            username: "alice".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["action"], "DELETE");
        assert_eq!(json["username"], "alice");
    }
}
