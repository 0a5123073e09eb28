//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use warehouse_entity::audit::AuditFilter;
use warehouse_entity::item::{CreateItem, UpdateItem};

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of `POST /api/items`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateItemRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Stock-keeping unit.
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    /// Units on hand.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity: i32,
    /// Unit price.
    pub price: Decimal,
    /// Storage location.
    #[validate(length(max = 128))]
    pub location: Option<String>,
}

impl From<CreateItemRequest> for CreateItem {
    fn from(req: CreateItemRequest) -> Self {
        Self {
            name: req.name,
            sku: req.sku,
            quantity: req.quantity,
            price: req.price,
            location: req.location,
        }
    }
}

/// Body of `PUT /api/items/{id}`. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateItemRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// New SKU.
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    /// New quantity.
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    /// New unit price.
    pub price: Option<Decimal>,
    /// New storage location.
    #[validate(length(max = 128))]
    pub location: Option<String>,
}

impl From<UpdateItemRequest> for UpdateItem {
    fn from(req: UpdateItemRequest) -> Self {
        Self {
            name: req.name,
            sku: req.sku,
            quantity: req.quantity,
            price: req.price,
            location: req.location,
        }
    }
}

/// Reads an optional number, treating anything unparseable as absent so
/// the service falls back to its defaults.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

/// Query of `GET /api/items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListItemsQuery {
    /// Substring matched against name or SKU.
    pub search: Option<String>,
    /// Page number (1-based).
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<i64>,
    /// Rows per page.
    #[serde(default, deserialize_with = "lenient_number")]
    pub page_size: Option<i64>,
}

/// Query of `GET /api/audit` and `GET /api/audit/export`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditQuery {
    /// Restrict to one item.
    pub item_id: Option<Uuid>,
    /// Restrict to one acting user.
    pub user_id: Option<Uuid>,
    /// `INSERT`, `UPDATE` or `DELETE`.
    pub action: Option<String>,
    /// Inclusive lower bound (RFC 3339).
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound (RFC 3339).
    pub date_to: Option<DateTime<Utc>>,
    /// Page number (1-based). Ignored by export.
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<i64>,
    /// Rows per page. Ignored by export.
    #[serde(default, deserialize_with = "lenient_number")]
    pub page_size: Option<i64>,
}

impl AuditQuery {
    /// The filter part of the query.
    pub fn filter(&self) -> AuditFilter {
        AuditFilter {
            item_id: self.item_id,
            user_id: self.user_id,
            action: self.action.clone(),
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }
}
