//! Inventory service: role-gated CRUD over items.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use warehouse_auth::{AccessPolicy, Operation};
use warehouse_core::config::pagination::PaginationConfig;
use warehouse_core::types::{Page, PageRequest};
use warehouse_core::{AppError, AppResult};
use warehouse_database::ItemStore;
use warehouse_entity::item::{CreateItem, Item, ItemFilter, UpdateItem};

use crate::context::RequestContext;

/// Orchestrates item reads and writes on behalf of an authenticated caller.
#[derive(Clone)]
pub struct InventoryService {
    /// Item persistence.
    items: Arc<dyn ItemStore>,
    /// Role table.
    policy: Arc<AccessPolicy>,
    /// Page size bounds.
    pagination: PaginationConfig,
}

impl std::fmt::Debug for InventoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryService")
            .field("pagination", &self.pagination)
            .finish_non_exhaustive()
    }
}

impl InventoryService {
    /// Creates a new inventory service.
    pub fn new(
        items: Arc<dyn ItemStore>,
        policy: Arc<AccessPolicy>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            items,
            policy,
            pagination,
        }
    }

    /// Creates an item. Admins and managers only.
    pub async fn create_item(&self, ctx: &RequestContext, input: CreateItem) -> AppResult<Item> {
        self.policy.require(&ctx.claims, Operation::Create)?;
        let input = input.validated()?;

        let item = self.items.create(&ctx.cancel, ctx.user_id(), &input).await?;
        info!(item_id = %item.id, sku = %item.sku, user_id = %ctx.user_id(), "Item created");
        Ok(item)
    }

    /// Fetches one item.
    pub async fn get_item(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Item> {
        self.policy.require(&ctx.claims, Operation::View)?;
        self.items.get(&ctx.cancel, id).await
    }

    /// Lists items, newest first. A blank search matches everything.
    pub async fn list_items(
        &self,
        ctx: &RequestContext,
        search: Option<String>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> AppResult<Page<Item>> {
        self.policy.require(&ctx.claims, Operation::View)?;

        let filter = ItemFilter {
            search: search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };
        let page = PageRequest::from_query(page, page_size, &self.pagination);
        self.items.list(&ctx.cancel, &filter, page).await
    }

    /// Applies a sparse update. An empty change set never reaches the store.
    pub async fn update_item(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        changes: UpdateItem,
    ) -> AppResult<Item> {
        self.policy.require(&ctx.claims, Operation::Update)?;
        if !changes.has_changes() {
            return Err(AppError::no_changes());
        }
        let changes = changes.validated()?;

        let item = self
            .items
            .update(&ctx.cancel, ctx.user_id(), id, &changes)
            .await?;
        info!(item_id = %id, user_id = %ctx.user_id(), "Item updated");
        Ok(item)
    }

    /// Deletes an item. Admins only.
    pub async fn delete_item(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        self.policy.require(&ctx.claims, Operation::Delete)?;

        self.items.delete(&ctx.cancel, ctx.user_id(), id).await?;
        info!(item_id = %id, user_id = %ctx.user_id(), "Item deleted");
        Ok(())
    }
}
