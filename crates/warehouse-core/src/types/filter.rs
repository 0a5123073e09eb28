//! Parameterized predicate assembly for list and export queries.
//!
//! Filters are collected as tagged [`Predicate`] values and rendered into
//! a `WHERE` clause whose values are always bound through positional
//! placeholders (`$1`, `$2`, ...). Column names come from `&'static str`
//! constants in the store code and are the only text ever spliced into
//! the SQL.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::pagination::PageRequest;

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    /// A UUID value.
    Uuid(Uuid),
    /// A text value.
    Text(String),
    /// A timestamp value.
    Timestamp(DateTime<Utc>),
    /// An integer value.
    Integer(i64),
}

impl BindValue {
    fn compare(&self, other: &BindValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<Uuid> for BindValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for BindValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

/// A single filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = value`.
    Eq {
        /// Column name.
        column: &'static str,
        /// Value to match exactly.
        value: BindValue,
    },
    /// Inclusive range; either side may be open but not both.
    Range {
        /// Column name.
        column: &'static str,
        /// Lower bound (`>=`).
        from: Option<BindValue>,
        /// Upper bound (`<=`).
        to: Option<BindValue>,
    },
    /// Case-insensitive substring match against any of the columns.
    Contains {
        /// Columns searched, combined with `OR`.
        columns: Vec<&'static str>,
        /// Raw search text, without wildcards.
        needle: String,
    },
}

/// Read access to a row's columns by the same names the SQL uses.
///
/// Implemented by in-process stores so they evaluate a [`QueryPlan`]
/// with exactly the semantics of the rendered SQL.
pub trait FieldSource {
    /// Current value of `column`, or `None` when the column is NULL or
    /// unknown.
    fn field(&self, column: &str) -> Option<BindValue>;
}

impl Predicate {
    /// Evaluate this predicate against an in-memory row.
    pub fn matches(&self, row: &impl FieldSource) -> bool {
        match self {
            Predicate::Eq { column, value } => row
                .field(column)
                .is_some_and(|v| v.compare(value) == Some(Ordering::Equal)),
            Predicate::Range { column, from, to } => {
                let Some(v) = row.field(column) else {
                    return false;
                };
                let above = from
                    .as_ref()
                    .is_none_or(|f| matches!(v.compare(f), Some(Ordering::Greater | Ordering::Equal)));
                let below = to
                    .as_ref()
                    .is_none_or(|t| matches!(v.compare(t), Some(Ordering::Less | Ordering::Equal)));
                above && below
            }
            Predicate::Contains { columns, needle } => {
                let needle = needle.to_lowercase();
                columns.iter().any(|c| match row.field(c) {
                    Some(BindValue::Text(text)) => text.to_lowercase().contains(&needle),
                    _ => false,
                })
            }
        }
    }
}

/// How many rows the rendered query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// One page of a paginated listing.
    Page(PageRequest),
    /// A flat row cap, used by bulk exports.
    Limit(i64),
}

/// Collects optional predicates and renders them into a [`QueryPlan`].
///
/// Absent predicates are skipped entirely; nothing is ever rendered as a
/// match-anything clause.
#[derive(Debug, Clone, Default)]
pub struct QueryFilterBuilder {
    predicates: Vec<Predicate>,
}

impl QueryFilterBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality predicate when `value` is present.
    pub fn eq<V: Into<BindValue>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.predicates.push(Predicate::Eq {
                column,
                value: value.into(),
            });
        }
        self
    }

    /// Add an inclusive range predicate when at least one bound is present.
    pub fn range<V: Into<BindValue>>(
        mut self,
        column: &'static str,
        from: Option<V>,
        to: Option<V>,
    ) -> Self {
        if from.is_some() || to.is_some() {
            self.predicates.push(Predicate::Range {
                column,
                from: from.map(Into::into),
                to: to.map(Into::into),
            });
        }
        self
    }

    /// Add a substring search over `columns` when `needle` is non-empty.
    pub fn contains(mut self, columns: &[&'static str], needle: Option<&str>) -> Self {
        if let Some(needle) = needle.filter(|n| !n.is_empty()) {
            self.predicates.push(Predicate::Contains {
                columns: columns.to_vec(),
                needle: needle.to_string(),
            });
        }
        self
    }

    /// Render the predicates and row bound into a plan.
    pub fn build(self, bound: Bound) -> QueryPlan {
        let mut clauses = Vec::with_capacity(self.predicates.len());
        let mut params = Vec::new();

        for predicate in &self.predicates {
            match predicate {
                Predicate::Eq { column, value } => {
                    params.push(value.clone());
                    clauses.push(format!("{column} = ${}", params.len()));
                }
                Predicate::Range { column, from, to } => {
                    if let Some(from) = from {
                        params.push(from.clone());
                        clauses.push(format!("{column} >= ${}", params.len()));
                    }
                    if let Some(to) = to {
                        params.push(to.clone());
                        clauses.push(format!("{column} <= ${}", params.len()));
                    }
                }
                Predicate::Contains { columns, needle } => {
                    params.push(BindValue::Text(format!("%{}%", escape_like(needle))));
                    let idx = params.len();
                    let alternatives: Vec<String> = columns
                        .iter()
                        .map(|c| format!("{c} ILIKE ${idx}"))
                        .collect();
                    clauses.push(format!("({})", alternatives.join(" OR ")));
                }
            }
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let bound_clause = match bound {
            Bound::Page(page) => {
                params.push(BindValue::Integer(page.limit()));
                params.push(BindValue::Integer(page.offset()));
                let n = params.len();
                format!("LIMIT ${} OFFSET ${}", n - 1, n)
            }
            Bound::Limit(limit) => {
                params.push(BindValue::Integer(limit));
                format!("LIMIT ${}", params.len())
            }
        };

        QueryPlan {
            predicates: self.predicates,
            where_clause,
            bound_clause,
            params,
            bound,
        }
    }
}

/// A rendered, parameterized query fragment.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    predicates: Vec<Predicate>,
    where_clause: String,
    bound_clause: String,
    params: Vec<BindValue>,
    bound: Bound,
}

impl QueryPlan {
    /// `WHERE ...` clause, or an empty string when there are no predicates.
    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// `LIMIT $n OFFSET $m` or `LIMIT $n`.
    pub fn bound_clause(&self) -> &str {
        &self.bound_clause
    }

    /// Values for every placeholder, in placeholder order.
    pub fn params(&self) -> &[BindValue] {
        &self.params
    }

    /// Assemble the final statement around the rendered fragments.
    pub fn render(&self, select: &str, order_by: &str) -> String {
        let mut sql = String::from(select);
        if !self.where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&self.where_clause);
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by);
        sql.push(' ');
        sql.push_str(&self.bound_clause);
        sql
    }

    /// Whether an in-memory row satisfies every predicate.
    pub fn matches(&self, row: &impl FieldSource) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }

    /// Apply the row bound to an already filtered and ordered sequence.
    pub fn window<T>(&self, rows: Vec<T>) -> Vec<T> {
        let (skip, take) = match self.bound {
            Bound::Page(page) => (page.offset(), page.limit()),
            Bound::Limit(limit) => (0, limit),
        };
        rows.into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(take).unwrap_or(0))
            .collect()
    }
}

/// Escape `LIKE` metacharacters so the needle matches literally.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
