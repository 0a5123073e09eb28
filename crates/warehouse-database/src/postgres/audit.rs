//! PostgreSQL audit store.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use warehouse_core::AppResult;
use warehouse_core::types::{Bound, Page, PageRequest};
use warehouse_entity::audit::{AuditCriteria, AuditRecord};

use super::bind::bind_plan;
use crate::retry::RetryPolicy;
use crate::stores::AuditStore;

const AUDIT_COLUMNS: &str = "a.id, a.item_id, a.action, a.changed_by, a.old_data, a.new_data, \
                             a.diff, a.changed_at, COALESCE(u.username, 'unknown') AS username";

const AUDIT_SOURCE: &str = "FROM item_audit_log a LEFT JOIN users u ON u.id = a.changed_by";

const NEWEST_FIRST: &str = "a.changed_at DESC, a.id DESC";

#[derive(FromRow)]
struct AuditRow {
    #[sqlx(flatten)]
    record: AuditRecord,
    total_count: i64,
}

/// Audit store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgAuditStore {
    /// Create a new audit store.
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn list(
        &self,
        cancel: &CancellationToken,
        criteria: &AuditCriteria,
        page: PageRequest,
    ) -> AppResult<Page<AuditRecord>> {
        let plan = criteria.plan(Bound::Page(page));
        let sql = plan.render(
            &format!("SELECT {AUDIT_COLUMNS}, COUNT(*) OVER() AS total_count {AUDIT_SOURCE}"),
            NEWEST_FIRST,
        );
        debug!(%sql, "Listing audit entries");

        let rows = self
            .retry
            .run("AuditStore.list", cancel, || {
                let query = bind_plan(sqlx::query_as::<_, AuditRow>(&sql), &plan);
                async move { query.fetch_all(&self.pool).await }
            })
            .await?;

        let total = rows.first().map(|r| r.total_count).unwrap_or(0);
        let records = rows.into_iter().map(|r| r.record).collect();
        Ok(Page::new(records, total, page))
    }

    async fn history(
        &self,
        cancel: &CancellationToken,
        item_id: Uuid,
    ) -> AppResult<Vec<AuditRecord>> {
        let sql = format!(
            "SELECT {AUDIT_COLUMNS} {AUDIT_SOURCE} WHERE a.item_id = $1 ORDER BY {NEWEST_FIRST}"
        );

        self.retry
            .run("AuditStore.history", cancel, || {
                let query = sqlx::query_as::<_, AuditRecord>(&sql).bind(item_id);
                async move { query.fetch_all(&self.pool).await }
            })
            .await
    }

    async fn export(
        &self,
        cancel: &CancellationToken,
        criteria: &AuditCriteria,
        max_rows: i64,
    ) -> AppResult<Vec<AuditRecord>> {
        let plan = criteria.plan(Bound::Limit(max_rows));
        let sql = plan.render(&format!("SELECT {AUDIT_COLUMNS} {AUDIT_SOURCE}"), NEWEST_FIRST);
        debug!(%sql, max_rows, "Exporting audit entries");

        self.retry
            .run("AuditStore.export", cancel, || {
                let query = bind_plan(sqlx::query_as::<_, AuditRecord>(&sql), &plan);
                async move { query.fetch_all(&self.pool).await }
            })
            .await
    }
}
