//! PostgreSQL item store.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use warehouse_core::types::{Bound, Page, PageRequest};
use warehouse_core::{AppError, AppResult};
use warehouse_entity::audit::{AuditAction, NewAuditEntry};
use warehouse_entity::item::{CreateItem, Item, ItemFilter, UpdateItem};

use super::bind::bind_plan;
use crate::retry::RetryPolicy;
use crate::stores::ItemStore;

const ITEM_COLUMNS: &str = "id, name, sku, quantity, price, location, created_at, updated_at";

#[derive(FromRow)]
struct ItemRow {
    #[sqlx(flatten)]
    item: Item,
    total_count: i64,
}

/// Item store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgItemStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgItemStore {
    /// Create a new item store.
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    async fn insert_once(&self, actor: Uuid, input: &CreateItem) -> Result<Item, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        tag_actor(&mut tx, actor).await?;

        let item = sqlx::query_as::<_, Item>(&format!(
            "INSERT INTO items (id, name, sku, quantity, price, location) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ITEM_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(&input.sku)
        .bind(input.quantity)
        .bind(input.price)
        .bind(&input.location)
        .fetch_one(&mut *tx)
        .await?;

        append_audit(
            &mut tx,
            &NewAuditEntry {
                item_id: item.id,
                action: AuditAction::Insert,
                changed_by: actor,
                old_data: None,
                new_data: Some(item.snapshot()),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(item)
    }

    async fn update_once(
        &self,
        actor: Uuid,
        id: Uuid,
        changes: &UpdateItem,
    ) -> Result<Item, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        tag_actor(&mut tx, actor).await?;

        let before = lock_item(&mut tx, id).await?;

        let mut query = QueryBuilder::<Postgres>::new("UPDATE items SET updated_at = NOW()");
        if let Some(name) = &changes.name {
            query.push(", name = ").push_bind(name.clone());
        }
        if let Some(sku) = &changes.sku {
            query.push(", sku = ").push_bind(sku.clone());
        }
        if let Some(quantity) = changes.quantity {
            query.push(", quantity = ").push_bind(quantity);
        }
        if let Some(price) = changes.price {
            query.push(", price = ").push_bind(price);
        }
        if let Some(location) = &changes.location {
            query.push(", location = ").push_bind(location.clone());
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(ITEM_COLUMNS);

        let after = query.build_query_as::<Item>().fetch_one(&mut *tx).await?;

        append_audit(
            &mut tx,
            &NewAuditEntry {
                item_id: id,
                action: AuditAction::Update,
                changed_by: actor,
                old_data: Some(before.snapshot()),
                new_data: Some(after.snapshot()),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(after)
    }

    async fn delete_once(&self, actor: Uuid, id: Uuid) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        tag_actor(&mut tx, actor).await?;

        let before = lock_item(&mut tx, id).await?;

        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        append_audit(
            &mut tx,
            &NewAuditEntry {
                item_id: id,
                action: AuditAction::Delete,
                changed_by: actor,
                old_data: Some(before.snapshot()),
                new_data: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn create(
        &self,
        cancel: &CancellationToken,
        actor: Uuid,
        input: &CreateItem,
    ) -> AppResult<Item> {
        self.retry
            .run("ItemStore.create", cancel, || async move {
                self.insert_once(actor, input).await
            })
            .await
    }

    async fn get(&self, cancel: &CancellationToken, id: Uuid) -> AppResult<Item> {
        self.retry
            .run("ItemStore.get", cancel, || async move {
                sqlx::query_as::<_, Item>(&format!(
                    "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
                ))
                .bind(id)
                .fetch_one(&self.pool)
                .await
            })
            .await
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> AppResult<Page<Item>> {
        let plan = filter.plan(Bound::Page(page));
        let sql = plan.render(
            &format!("SELECT {ITEM_COLUMNS}, COUNT(*) OVER() AS total_count FROM items"),
            "created_at DESC, id DESC",
        );
        debug!(%sql, "Listing items");

        let rows = self
            .retry
            .run("ItemStore.list", cancel, || {
                let query = bind_plan(sqlx::query_as::<_, ItemRow>(&sql), &plan);
                async move { query.fetch_all(&self.pool).await }
            })
            .await?;

        let total = rows.first().map(|r| r.total_count).unwrap_or(0);
        let items = rows.into_iter().map(|r| r.item).collect();
        Ok(Page::new(items, total, page))
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        actor: Uuid,
        id: Uuid,
        changes: &UpdateItem,
    ) -> AppResult<Item> {
        if !changes.has_changes() {
            return Err(AppError::no_changes());
        }

        self.retry
            .run("ItemStore.update", cancel, || async move {
                self.update_once(actor, id, changes).await
            })
            .await
    }

    async fn delete(&self, cancel: &CancellationToken, actor: Uuid, id: Uuid) -> AppResult<()> {
        self.retry
            .run("ItemStore.delete", cancel, || async move {
                self.delete_once(actor, id).await
            })
            .await?;

        Ok(())
    }
}

/// Record the acting user on the transaction for change-capture triggers.
async fn tag_actor(tx: &mut Transaction<'_, Postgres>, actor: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT set_config('app.current_user_id', $1, true)")
        .bind(actor.to_string())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn lock_item(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<Item, sqlx::Error> {
    sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_one(&mut **tx)
    .await
}

async fn append_audit(
    tx: &mut Transaction<'_, Postgres>,
    entry: &NewAuditEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO item_audit_log (item_id, action, changed_by, old_data, new_data, diff) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(entry.item_id)
    .bind(entry.action)
    .bind(entry.changed_by)
    .bind(&entry.old_data)
    .bind(&entry.new_data)
    .bind(entry.diff())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
