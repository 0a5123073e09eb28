//! Item entity model.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use warehouse_core::types::{BindValue, Bound, FieldSource, QueryFilterBuilder, QueryPlan};
use warehouse_core::{AppError, AppResult};

use super::columns;

/// Maximum length of an item name.
pub const MAX_NAME_LEN: usize = 255;
/// Maximum length of a SKU.
pub const MAX_SKU_LEN: usize = 64;
/// Maximum length of a storage location.
pub const MAX_LOCATION_LEN: usize = 128;

/// A stock item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Item {
    /// Unique item identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Stock-keeping unit, unique across all items.
    pub sku: String,
    /// Units on hand.
    pub quantity: i32,
    /// Unit price with two decimal places.
    pub price: Decimal,
    /// Storage location.
    pub location: Option<String>,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Full-row JSON snapshot recorded in the audit trail.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "sku": self.sku,
            "quantity": self.quantity,
            "price": self.price,
            "location": self.location,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        })
    }

    /// Apply a sparse update in place.
    pub fn apply(&mut self, changes: &UpdateItem) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(sku) = &changes.sku {
            self.sku = sku.clone();
        }
        if let Some(quantity) = changes.quantity {
            self.quantity = quantity;
        }
        if let Some(price) = changes.price {
            self.price = to_money(price);
        }
        if let Some(location) = &changes.location {
            self.location = Some(location.clone());
        }
    }
}

impl FieldSource for Item {
    fn field(&self, column: &str) -> Option<BindValue> {
        match column {
            columns::NAME => Some(BindValue::Text(self.name.clone())),
            columns::SKU => Some(BindValue::Text(self.sku.clone())),
            columns::CREATED_AT => Some(BindValue::Timestamp(self.created_at)),
            _ => None,
        }
    }
}

/// Data required to create an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItem {
    /// Display name.
    pub name: String,
    /// Stock-keeping unit.
    pub sku: String,
    /// Units on hand.
    pub quantity: i32,
    /// Unit price.
    pub price: Decimal,
    /// Storage location.
    pub location: Option<String>,
}

impl CreateItem {
    /// Check field bounds and round the price to two decimal places.
    pub fn validated(mut self) -> AppResult<Self> {
        check_text("name", &self.name, MAX_NAME_LEN)?;
        check_text("sku", &self.sku, MAX_SKU_LEN)?;
        if let Some(location) = &self.location {
            check_len("location", location, MAX_LOCATION_LEN)?;
        }
        check_quantity(self.quantity)?;
        check_price(self.price)?;
        self.price = to_money(self.price);
        Ok(self)
    }
}

/// A sparse item update. Only fields that are `Some` change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItem {
    /// New display name.
    pub name: Option<String>,
    /// New SKU.
    pub sku: Option<String>,
    /// New quantity.
    pub quantity: Option<i32>,
    /// New unit price.
    pub price: Option<Decimal>,
    /// New storage location.
    pub location: Option<String>,
}

impl UpdateItem {
    /// Whether at least one field is set.
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.sku.is_some()
            || self.quantity.is_some()
            || self.price.is_some()
            || self.location.is_some()
    }

    /// Check bounds of every supplied field and round the price.
    pub fn validated(mut self) -> AppResult<Self> {
        if let Some(name) = &self.name {
            check_text("name", name, MAX_NAME_LEN)?;
        }
        if let Some(sku) = &self.sku {
            check_text("sku", sku, MAX_SKU_LEN)?;
        }
        if let Some(location) = &self.location {
            check_len("location", location, MAX_LOCATION_LEN)?;
        }
        if let Some(quantity) = self.quantity {
            check_quantity(quantity)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
            self.price = Some(to_money(price));
        }
        Ok(self)
    }
}

/// Largest price a `NUMERIC(12,2)` column holds: 9,999,999,999.99.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Item list filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Case-insensitive substring matched against name or SKU.
    pub search: Option<String>,
}

impl ItemFilter {
    /// Render this filter into a query plan bounded by `bound`.
    pub fn plan(&self, bound: Bound) -> QueryPlan {
        QueryFilterBuilder::new()
            .contains(&[columns::NAME, columns::SKU], self.search.as_deref())
            .build(bound)
    }
}

/// Round half away from zero to exactly two decimal places.
pub fn to_money(price: Decimal) -> Decimal {
    let mut rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

fn check_text(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    check_len(field, value, max)
}

fn check_len(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn check_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::validation("quantity must not be negative"));
    }
    Ok(())
}

fn check_price(price: Decimal) -> AppResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::validation("price must not be negative"));
    }
    if to_money(price) > MAX_PRICE {
        return Err(AppError::validation(format!("price must not exceed {MAX_PRICE}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use warehouse_core::ErrorKind;
    use warehouse_core::types::PageRequest;

    fn laptop() -> Item {
        Item {
            id: Uuid::new_v4(),
            name: "Laptop".into(),
            sku: "LAP-001".into(),
            quantity: 5,
            price: Decimal::from_str("999.00").unwrap(),
            location: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_changes() {
        assert!(!UpdateItem::default().has_changes());
        assert!(
            UpdateItem {
                quantity: Some(0),
                ..Default::default()
            }
            .has_changes()
        );
    }

    #[test]
    fn test_create_rounds_price() {
        let input = CreateItem {
            name: "Mouse".into(),
            sku: "MOU-1".into(),
            quantity: 0,
            price: Decimal::from_str("19.999").unwrap(),
            location: Some("A-1".into()),
        }
        .validated()
        .unwrap();
        assert_eq!(input.price.to_string(), "20.00");
    }

    #[test]
    fn test_to_money_pads_and_rounds() {
        assert_eq!(to_money(Decimal::from(5)).to_string(), "5.00");
        assert_eq!(to_money(Decimal::from_str("2.345").unwrap()).to_string(), "2.35");
    }

    #[test]
    fn test_create_rejects_bad_fields() {
        let base = CreateItem {
            name: "Mouse".into(),
            sku: "MOU-1".into(),
            quantity: 1,
            price: Decimal::ONE,
            location: None,
        };

        let negative = CreateItem {
            quantity: -1,
            ..base.clone()
        };
        assert_eq!(negative.validated().unwrap_err().kind, ErrorKind::Validation);

        let blank = CreateItem {
            name: "  ".into(),
            ..base.clone()
        };
        assert!(blank.validated().is_err());

        let long_sku = CreateItem {
            sku: "X".repeat(MAX_SKU_LEN + 1),
            ..base.clone()
        };
        assert!(long_sku.validated().is_err());

        let cheap = CreateItem {
            price: Decimal::from_str("-0.01").unwrap(),
            ..base
        };
        assert!(cheap.validated().is_err());
    }

    #[test]
    fn test_price_fits_the_column() {
        assert_eq!(MAX_PRICE.to_string(), "9999999999.99");
        let base = CreateItem {
            name: "Vault".into(),
            sku: "VLT-1".into(),
            quantity: 1,
            price: MAX_PRICE,
            location: None,
        };
        assert!(base.clone().validated().is_ok());

        for raw in ["10000000000", "9999999999.995"] {
            let err = CreateItem {
                price: Decimal::from_str(raw).unwrap(),
                ..base.clone()
            }
            .validated()
            .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{raw}");
        }

        let update = UpdateItem {
            price: Some(Decimal::from_str("12345678901.00").unwrap()),
            ..Default::default()
        };
        assert_eq!(update.validated().unwrap_err().kind, ErrorKind::Validation);
    }

    #[test]
    fn test_apply_touches_only_supplied_fields() {
        let mut item = laptop();
        let renamed = UpdateItem {
            name: Some("Gaming Laptop".into()),
            price: Some(Decimal::from_str("1299").unwrap()),
            ..Default::default()
        };
        item.apply(&renamed);
        assert_eq!(item.name, "Gaming Laptop");
        assert_eq!(item.sku, "LAP-001");
        assert_eq!(item.quantity, 5);
        assert_eq!(item.price.to_string(), "1299.00");
    }

    #[test]
    fn test_snapshot_serializes_price_as_string() {
        let snap = laptop().snapshot();
        assert_eq!(snap["price"], serde_json::json!("999.00"));
        assert_eq!(snap["location"], serde_json::Value::Null);
    }

    #[test]
    fn test_filter_plan_searches_name_and_sku() {
        let filter = ItemFilter {
            search: Some("lap".into()),
        };
        let plan = filter.plan(Bound::Page(PageRequest { page: 1, page_size: 20 }));
        assert_eq!(plan.where_clause(), "WHERE (name ILIKE $1 OR sku ILIKE $1)");
        assert!(plan.matches(&laptop()));
    }
}
