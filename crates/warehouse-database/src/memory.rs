//! In-process store with the same contract as the PostgreSQL stores.
//!
//! All state lives behind one mutex, so an item mutation and its audit
//! entry become visible together or not at all.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use warehouse_core::types::{Bound, Page, PageRequest};
use warehouse_core::{AppError, AppResult};
use warehouse_entity::audit::{AuditAction, AuditCriteria, AuditEntry, AuditRecord, NewAuditEntry};
use warehouse_entity::item::{CreateItem, Item, ItemFilter, UpdateItem};
use warehouse_entity::user::{CreateUser, User};

use crate::stores::{AuditStore, ItemStore, UserStore};

const UNKNOWN_USER: &str = "unknown";

#[derive(Debug, Default)]
struct State {
    /// Insertion order, oldest first.
    items: Vec<Item>,
    audit: Vec<AuditEntry>,
    users: HashMap<Uuid, User>,
    next_audit_id: i64,
}

impl State {
    fn record(&mut self, new: NewAuditEntry) {
        self.next_audit_id += 1;
        let diff = new.diff();
        self.audit.push(AuditEntry {
            id: self.next_audit_id,
            item_id: new.item_id,
            action: new.action,
            changed_by: new.changed_by,
            old_data: new.old_data,
            new_data: new.new_data,
            diff: Some(diff),
            changed_at: Utc::now(),
        });
    }

    fn sku_taken(&self, sku: &str, except: Option<Uuid>) -> bool {
        self.items
            .iter()
            .any(|item| item.sku == sku && Some(item.id) != except)
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn joined(&self, entry: &AuditEntry) -> AuditRecord {
        let username = self
            .users
            .get(&entry.changed_by)
            .map(|u| u.username.clone())
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        AuditRecord {
            entry: entry.clone(),
            username,
        }
    }

    /// Audit records matching `criteria`, newest first.
    fn audit_matching(&self, criteria: &AuditCriteria, bound: Bound) -> (Vec<AuditRecord>, i64) {
        let plan = criteria.plan(bound);
        let mut rows: Vec<AuditRecord> = self
            .audit
            .iter()
            .map(|e| self.joined(e))
            .filter(|r| plan.matches(r))
            .collect();
        rows.sort_by_key(|r| Reverse((r.entry.changed_at, r.entry.id)));
        let total = i64::try_from(rows.len()).unwrap_or(i64::MAX);
        (plan.window(rows), total)
    }
}

/// Store keeping items, the audit trail, and users in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user directly, bypassing uniqueness checks.
    pub fn seed_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    /// Remove a user, leaving their audit entries orphaned.
    pub fn remove_user(&self, id: Uuid) -> Option<User> {
        self.lock().users.remove(&id)
    }

    /// Number of audit entries recorded so far.
    pub fn audit_len(&self) -> usize {
        self.lock().audit.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_live(cancel: &CancellationToken, operation: &str) -> AppResult<()> {
    if cancel.is_cancelled() {
        return Err(AppError::cancelled(operation));
    }
    Ok(())
}

fn item_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Item {id} not found"))
}

/// Page metadata consistent with a window-function count: a page past the
/// end carries no rows and no total.
fn paged<T>(rows: Vec<T>, total: i64, page: PageRequest) -> Page<T> {
    let total = if rows.is_empty() { 0 } else { total };
    Page::new(rows, total, page)
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create(
        &self,
        cancel: &CancellationToken,
        actor: Uuid,
        input: &CreateItem,
    ) -> AppResult<Item> {
        ensure_live(cancel, "ItemStore.create")?;
        let mut state = self.lock();
        if state.sku_taken(&input.sku, None) {
            return Err(AppError::duplicate_sku(&input.sku));
        }

        let now = Utc::now();
        let item = Item {
            id: Uuid::now_v7(),
            name: input.name.clone(),
            sku: input.sku.clone(),
            quantity: input.quantity,
            price: input.price,
            location: input.location.clone(),
            created_at: now,
            updated_at: now,
        };
        state.record(NewAuditEntry {
            item_id: item.id,
            action: AuditAction::Insert,
            changed_by: actor,
            old_data: None,
            new_data: Some(item.snapshot()),
        });
        state.items.push(item.clone());

        Ok(item)
    }

    async fn get(&self, cancel: &CancellationToken, id: Uuid) -> AppResult<Item> {
        ensure_live(cancel, "ItemStore.get")?;
        let state = self.lock();
        state
            .position(id)
            .map(|idx| state.items[idx].clone())
            .ok_or_else(|| item_not_found(id))
    }

    async fn list(
        &self,
        cancel: &CancellationToken,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> AppResult<Page<Item>> {
        ensure_live(cancel, "ItemStore.list")?;
        let plan = filter.plan(Bound::Page(page));
        let state = self.lock();
        let mut rows: Vec<Item> = state
            .items
            .iter()
            .rev()
            .filter(|item| plan.matches(*item))
            .cloned()
            .collect();
        rows.sort_by_key(|item| Reverse(item.created_at));
        let total = i64::try_from(rows.len()).unwrap_or(i64::MAX);
        Ok(paged(plan.window(rows), total, page))
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        actor: Uuid,
        id: Uuid,
        changes: &UpdateItem,
    ) -> AppResult<Item> {
        ensure_live(cancel, "ItemStore.update")?;
        if !changes.has_changes() {
            return Err(AppError::no_changes());
        }

        let mut state = self.lock();
        let Some(idx) = state.position(id) else {
            return Err(item_not_found(id));
        };
        let current = state.items[idx].clone();
        if let Some(sku) = &changes.sku {
            if state.sku_taken(sku, Some(id)) {
                return Err(AppError::duplicate_sku(sku));
            }
        }

        let mut updated = current.clone();
        updated.apply(changes);
        updated.updated_at = Utc::now();
        state.record(NewAuditEntry {
            item_id: id,
            action: AuditAction::Update,
            changed_by: actor,
            old_data: Some(current.snapshot()),
            new_data: Some(updated.snapshot()),
        });
        state.items[idx] = updated.clone();

        Ok(updated)
    }

    async fn delete(&self, cancel: &CancellationToken, actor: Uuid, id: Uuid) -> AppResult<()> {
        ensure_live(cancel, "ItemStore.delete")?;
        let mut state = self.lock();
        let Some(idx) = state.position(id) else {
            return Err(item_not_found(id));
        };
        let removed = state.items.remove(idx);
        state.record(NewAuditEntry {
            item_id: id,
            action: AuditAction::Delete,
            changed_by: actor,
            old_data: Some(removed.snapshot()),
            new_data: None,
        });

        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn list(
        &self,
        cancel: &CancellationToken,
        criteria: &AuditCriteria,
        page: PageRequest,
    ) -> AppResult<Page<AuditRecord>> {
        ensure_live(cancel, "AuditStore.list")?;
        let (rows, total) = self.lock().audit_matching(criteria, Bound::Page(page));
        Ok(paged(rows, total, page))
    }

    async fn history(
        &self,
        cancel: &CancellationToken,
        item_id: Uuid,
    ) -> AppResult<Vec<AuditRecord>> {
        ensure_live(cancel, "AuditStore.history")?;
        let state = self.lock();
        let mut rows: Vec<AuditRecord> = state
            .audit
            .iter()
            .filter(|e| e.item_id == item_id)
            .map(|e| state.joined(e))
            .collect();
        rows.sort_by_key(|r| Reverse((r.entry.changed_at, r.entry.id)));
        Ok(rows)
    }

    async fn export(
        &self,
        cancel: &CancellationToken,
        criteria: &AuditCriteria,
        max_rows: i64,
    ) -> AppResult<Vec<AuditRecord>> {
        ensure_live(cancel, "AuditStore.export")?;
        let (rows, _) = self.lock().audit_matching(criteria, Bound::Limit(max_rows));
        Ok(rows)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(
        &self,
        cancel: &CancellationToken,
        username: &str,
    ) -> AppResult<User> {
        ensure_live(cancel, "UserStore.find_by_username")?;
        self.lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))
    }

    async fn list(&self, cancel: &CancellationToken) -> AppResult<Vec<User>> {
        ensure_live(cancel, "UserStore.list")?;
        let mut users: Vec<User> = self.lock().users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn create(&self, cancel: &CancellationToken, input: &CreateUser) -> AppResult<User> {
        ensure_live(cancel, "UserStore.create")?;
        let mut state = self.lock();
        if state.users.values().any(|u| u.username == input.username) {
            return Err(AppError::already_exists(format!(
                "User '{}' already exists",
                input.username
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: input.username.clone(),
            password_hash: input.password_hash.clone(),
            role: input.role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }
}
