//! Storage capabilities consumed by the service layer.
//!
//! Every method takes the caller's [`CancellationToken`]; implementations
//! abort promptly once it fires and report `Cancelled`.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use warehouse_core::AppResult;
use warehouse_core::types::{Page, PageRequest};
use warehouse_entity::audit::{AuditCriteria, AuditRecord};
use warehouse_entity::item::{CreateItem, Item, ItemFilter, UpdateItem};
use warehouse_entity::user::{CreateUser, User};

/// Item persistence. Each mutation writes its audit entry atomically with
/// the change, attributed to `actor`.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a new item. A SKU collision yields `DuplicateSku`.
    async fn create(
        &self,
        cancel: &CancellationToken,
        actor: Uuid,
        input: &CreateItem,
    ) -> AppResult<Item>;

    /// Fetch one item, or `NotFound`.
    async fn get(&self, cancel: &CancellationToken, id: Uuid) -> AppResult<Item>;

    /// One page of items, newest first, with the total match count.
    async fn list(
        &self,
        cancel: &CancellationToken,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> AppResult<Page<Item>>;

    /// Apply a sparse update. `NotFound` when the item does not exist,
    /// `NoChanges` when `changes` is empty.
    async fn update(
        &self,
        cancel: &CancellationToken,
        actor: Uuid,
        id: Uuid,
        changes: &UpdateItem,
    ) -> AppResult<Item>;

    /// Hard-delete an item. `NotFound` when nothing was deleted.
    async fn delete(&self, cancel: &CancellationToken, actor: Uuid, id: Uuid) -> AppResult<()>;
}

/// Read-only access to the audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// One page of entries matching `criteria`, newest first.
    async fn list(
        &self,
        cancel: &CancellationToken,
        criteria: &AuditCriteria,
        page: PageRequest,
    ) -> AppResult<Page<AuditRecord>>;

    /// Every entry of one item, newest first.
    async fn history(&self, cancel: &CancellationToken, item_id: Uuid)
    -> AppResult<Vec<AuditRecord>>;

    /// Up to `max_rows` entries matching `criteria`, newest first.
    async fn export(
        &self,
        cancel: &CancellationToken,
        criteria: &AuditCriteria,
        max_rows: i64,
    ) -> AppResult<Vec<AuditRecord>>;
}

/// User lookup and provisioning.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by exact username, or `NotFound`.
    async fn find_by_username(&self, cancel: &CancellationToken, username: &str)
    -> AppResult<User>;

    /// All users, ordered by username.
    async fn list(&self, cancel: &CancellationToken) -> AppResult<Vec<User>>;

    /// Insert a user. A username collision yields `AlreadyExists`.
    async fn create(&self, cancel: &CancellationToken, input: &CreateUser) -> AppResult<User>;
}
