//! Integration tests for the PostgreSQL stores.
//!
//! Run with `DATABASE_URL` pointing at a scratch database:
//! `cargo test --test postgres_stores -- --ignored`

mod helpers;

use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use warehouse_core::ErrorKind;
use warehouse_core::types::PageRequest;
use warehouse_database::migration::migration_status;
use warehouse_database::{AuditStore, ItemStore, UserStore};
use warehouse_entity::audit::{AuditAction, AuditCriteria};
use warehouse_entity::item::{ItemFilter, UpdateItem};
use warehouse_entity::user::{CreateUser, UserRole};

use helpers::{TestDb, new_item, unique};

fn first_page(page_size: i64) -> PageRequest {
    PageRequest { page: 1, page_size }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_writes_insert_audit_row() {
    let t = TestDb::new().await;
    let item = t
        .items
        .create(&t.cancel, t.actor.id, &new_item("Widget"))
        .await
        .unwrap();

    assert_eq!(item.price, Decimal::from_str("19.99").unwrap());
    assert_eq!(t.items.get(&t.cancel, item.id).await.unwrap().sku, item.sku);

    let history = t.audit.history(&t.cancel, item.id).await.unwrap();
    assert_eq!(history.len(), 1);
    let record = &history[0];
    assert_eq!(record.entry.action, AuditAction::Insert);
    assert_eq!(record.entry.changed_by, t.actor.id);
    assert_eq!(record.username, t.actor.username);
    assert!(record.entry.old_data.is_none());
    assert!(record.entry.new_data.is_some());

    let fields: Vec<String> = record
        .entry
        .changes()
        .unwrap()
        .into_iter()
        .map(|c| c.field)
        .collect();
    assert!(fields.contains(&"sku".to_string()));
    assert!(!fields.contains(&"updated_at".to_string()));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_sku_leaves_no_audit_row() {
    let t = TestDb::new().await;
    let first = new_item("Original");
    t.items.create(&t.cancel, t.actor.id, &first).await.unwrap();

    let mut copy = new_item("Copy");
    copy.sku = first.sku.clone();
    let err = t
        .items
        .create(&t.cancel, t.actor.id, &copy)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::DuplicateSku));

    let criteria = AuditCriteria {
        user_id: Some(t.actor.id),
        ..Default::default()
    };
    let page = t.audit.list(&t.cancel, &criteria, first_page(50)).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_to_taken_sku_is_duplicate() {
    let t = TestDb::new().await;
    let first = t
        .items
        .create(&t.cancel, t.actor.id, &new_item("Hinge"))
        .await
        .unwrap();
    let second = t
        .items
        .create(&t.cancel, t.actor.id, &new_item("Latch"))
        .await
        .unwrap();

    let changes = UpdateItem {
        sku: Some(first.sku.clone()),
        quantity: Some(9),
        ..Default::default()
    };
    let err = t
        .items
        .update(&t.cancel, t.actor.id, second.id, &changes)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::DuplicateSku));

    let unchanged = t.items.get(&t.cancel, second.id).await.unwrap();
    assert_eq!(unchanged.sku, second.sku);
    assert_eq!(unchanged.quantity, second.quantity);

    let history = t.audit.history(&t.cancel, second.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].entry.action, AuditAction::Insert);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_records_only_changed_fields() {
    let t = TestDb::new().await;
    let item = t
        .items
        .create(&t.cancel, t.actor.id, &new_item("Bolt"))
        .await
        .unwrap();

    let changes = UpdateItem {
        quantity: Some(42),
        ..Default::default()
    };
    let updated = t
        .items
        .update(&t.cancel, t.actor.id, item.id, &changes)
        .await
        .unwrap();
    assert_eq!(updated.quantity, 42);
    assert_eq!(updated.name, "Bolt");
    assert!(updated.updated_at >= item.updated_at);

    let history = t.audit.history(&t.cancel, item.id).await.unwrap();
    assert_eq!(history[0].entry.action, AuditAction::Update);
    let changes = history[0].entry.changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field, "quantity");
    assert_eq!(changes[0].old_value, serde_json::json!(5));
    assert_eq!(changes[0].new_value, serde_json::json!(42));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_missing_item_is_not_found() {
    let t = TestDb::new().await;
    let changes = UpdateItem {
        name: Some("Ghost".to_string()),
        ..Default::default()
    };
    let err = t
        .items
        .update(&t.cancel, t.actor.id, Uuid::new_v4(), &changes)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_keeps_history() {
    let t = TestDb::new().await;
    let item = t
        .items
        .create(&t.cancel, t.actor.id, &new_item("Nut"))
        .await
        .unwrap();

    t.items.delete(&t.cancel, t.actor.id, item.id).await.unwrap();
    assert!(
        t.items
            .get(&t.cancel, item.id)
            .await
            .unwrap_err()
            .is(ErrorKind::NotFound)
    );
    assert!(
        t.items
            .delete(&t.cancel, t.actor.id, item.id)
            .await
            .unwrap_err()
            .is(ErrorKind::NotFound)
    );

    let actions: Vec<AuditAction> = t
        .audit
        .history(&t.cancel, item.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.entry.action)
        .collect();
    assert_eq!(actions, vec![AuditAction::Delete, AuditAction::Insert]);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_search_treats_wildcards_literally() {
    let t = TestDb::new().await;
    let tag = unique("tag");
    t.items
        .create(&t.cancel, t.actor.id, &new_item(&format!("{tag} 100% cotton")))
        .await
        .unwrap();
    t.items
        .create(&t.cancel, t.actor.id, &new_item(&format!("{tag} 1000 cotton")))
        .await
        .unwrap();

    let filter = ItemFilter {
        search: Some(format!("{tag} 100%")),
    };
    let page = t.items.list(&t.cancel, &filter, first_page(10)).await.unwrap();
    assert_eq!(page.total, 1);
    assert!(page.items[0].name.contains("100%"));

    let filter = ItemFilter {
        search: Some(tag.to_uppercase()),
    };
    let page = t.items.list(&t.cancel, &filter, first_page(1)).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert!(page.items[0].name.contains("1000"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_audit_filters_and_export_cap() {
    let t = TestDb::new().await;
    let item = t
        .items
        .create(&t.cancel, t.actor.id, &new_item("Gear"))
        .await
        .unwrap();
    for qty in [1, 2, 3] {
        let changes = UpdateItem {
            quantity: Some(qty),
            ..Default::default()
        };
        t.items
            .update(&t.cancel, t.actor.id, item.id, &changes)
            .await
            .unwrap();
    }

    let updates = AuditCriteria {
        item_id: Some(item.id),
        action: Some(AuditAction::Update),
        ..Default::default()
    };
    let page = t.audit.list(&t.cancel, &updates, first_page(2)).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert!(page.items[0].entry.id > page.items[1].entry.id);

    let exported = t
        .audit
        .export(&t.cancel, &AuditCriteria::for_item(item.id), 2)
        .await
        .unwrap();
    assert_eq!(exported.len(), 2);
    assert_eq!(exported[0].entry.action, AuditAction::Update);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_store_round_trip() {
    let t = TestDb::new().await;
    let found = t
        .users
        .find_by_username(&t.cancel, &t.actor.username)
        .await
        .unwrap();
    assert_eq!(found.id, t.actor.id);
    assert_eq!(found.role, UserRole::Manager);

    let duplicate = CreateUser {
        username: t.actor.username.clone(),
        password_hash: "x".to_string(),
        role: UserRole::Viewer,
    };
    let err = t.users.create(&t.cancel, &duplicate).await.unwrap_err();
    assert!(err.is(ErrorKind::AlreadyExists));

    let listed = t.users.list(&t.cancel).await.unwrap();
    assert!(listed.windows(2).all(|w| w[0].username <= w[1].username));
    assert!(listed.iter().any(|u| u.id == t.actor.id));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_cancelled_token_aborts_store_call() {
    let t = TestDb::new().await;
    let cancel = t.cancel.child_token();
    cancel.cancel();
    let err = t.items.get(&cancel, Uuid::new_v4()).await.unwrap_err();
    assert!(err.is(ErrorKind::Cancelled));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_migrations_report_applied() {
    let t = TestDb::new().await;
    let status = migration_status(t.db.pool()).await.unwrap();
    assert!(!status.is_empty());
    assert!(status.iter().all(|m| m.applied));
}
