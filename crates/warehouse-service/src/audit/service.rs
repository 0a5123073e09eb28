//! Audit service: role-gated reads of the item audit trail.

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use warehouse_auth::{AccessPolicy, Operation};
use warehouse_core::AppResult;
use warehouse_core::config::export::ExportConfig;
use warehouse_core::config::pagination::PaginationConfig;
use warehouse_core::types::{Page, PageRequest};
use warehouse_database::AuditStore;
use warehouse_entity::audit::diff::FieldChange;
use warehouse_entity::audit::{AuditCriteria, AuditFilter, AuditRecord};

use super::export::write_audit_csv;
use crate::context::RequestContext;

/// An audit record together with its decoded field changes.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntryView {
    /// The stored record.
    #[serde(flatten)]
    pub record: AuditRecord,
    /// Field-level changes, sorted by field name.
    pub changes: Vec<FieldChange>,
}

impl From<AuditRecord> for AuditEntryView {
    fn from(record: AuditRecord) -> Self {
        let changes = record.entry.changes().unwrap_or_else(|e| {
            warn!(audit_id = record.entry.id, error = %e, "Stored diff could not be decoded");
            Vec::new()
        });
        Self { record, changes }
    }
}

/// Serves audit listings, per-item history, and CSV export.
#[derive(Clone)]
pub struct AuditService {
    /// Audit persistence.
    audit: Arc<dyn AuditStore>,
    /// Role table.
    policy: Arc<AccessPolicy>,
    /// Page size bounds.
    pagination: PaginationConfig,
    /// Export limits.
    export: ExportConfig,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService")
            .field("pagination", &self.pagination)
            .field("export", &self.export)
            .finish_non_exhaustive()
    }
}

impl AuditService {
    /// Creates a new audit service.
    pub fn new(
        audit: Arc<dyn AuditStore>,
        policy: Arc<AccessPolicy>,
        pagination: PaginationConfig,
        export: ExportConfig,
    ) -> Self {
        Self {
            audit,
            policy,
            pagination,
            export,
        }
    }

    /// Lists entries matching `filter`, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: &AuditFilter,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> AppResult<Page<AuditEntryView>> {
        self.policy.require(&ctx.claims, Operation::ViewAudit)?;
        let criteria = filter.parse()?;
        let page = PageRequest::from_query(page, page_size, &self.pagination);

        let records = self.audit.list(&ctx.cancel, &criteria, page).await?;
        Ok(records.map(AuditEntryView::from))
    }

    /// Every entry recorded for one item, newest first.
    pub async fn item_history(
        &self,
        ctx: &RequestContext,
        item_id: Uuid,
    ) -> AppResult<Vec<AuditEntryView>> {
        self.policy.require(&ctx.claims, Operation::ViewAudit)?;

        let records = self.audit.history(&ctx.cancel, item_id).await?;
        Ok(records.into_iter().map(AuditEntryView::from).collect())
    }

    /// Writes matching entries to `sink` as CSV, at most `export.max_rows`
    /// of them. Returns the number of data rows written.
    pub async fn export<W: Write>(
        &self,
        ctx: &RequestContext,
        filter: &AuditFilter,
        sink: W,
    ) -> AppResult<usize> {
        self.policy.require(&ctx.claims, Operation::Export)?;
        let criteria: AuditCriteria = filter.parse()?;

        let records = self
            .audit
            .export(&ctx.cancel, &criteria, self.export.max_rows)
            .await?;
        let rows = write_audit_csv(sink, &records)?;

        info!(user_id = %ctx.user_id(), rows, "Audit exported");
        Ok(rows)
    }
}
