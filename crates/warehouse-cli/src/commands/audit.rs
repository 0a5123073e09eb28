//! Audit trail CLI commands.

use std::fs::File;
use std::io::BufWriter;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use warehouse_core::config::AppConfig;
use warehouse_database::{AuditStore, PgAuditStore, RetryPolicy};
use warehouse_entity::audit::AuditFilter;
use warehouse_service::audit::write_audit_csv;

use crate::output;

/// Arguments for audit commands
#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Audit subcommand
    #[command(subcommand)]
    pub command: AuditCommand,
}

/// Audit subcommands
#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// Export audit entries to a CSV file
    Export {
        /// Output file path
        #[arg(short, long, default_value = "audit_export.csv")]
        output: String,
        /// Restrict to one item
        #[arg(long)]
        item_id: Option<Uuid>,
        /// Restrict to one acting user
        #[arg(long)]
        user_id: Option<Uuid>,
        /// INSERT, UPDATE, or DELETE
        #[arg(long)]
        action: Option<String>,
        /// Inclusive lower bound (RFC 3339)
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Inclusive upper bound (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
}

/// Execute audit commands
pub async fn execute(
    args: &AuditArgs,
    config: &AppConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match &args.command {
        AuditCommand::Export {
            output: path,
            item_id,
            user_id,
            action,
            from,
            to,
        } => {
            let criteria = AuditFilter {
                item_id: *item_id,
                user_id: *user_id,
                action: action.clone(),
                date_from: *from,
                date_to: *to,
            }
            .parse()?;

            let db = super::connect(config, cancel).await?;
            let store = PgAuditStore::new(db.pool().clone(), RetryPolicy::from_config(&config.retry));
            let records = store
                .export(cancel, &criteria, config.export.max_rows)
                .await
                .context("Failed to read audit entries")?;
            db.close().await;

            let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
            let rows = write_audit_csv(BufWriter::new(file), &records)?;
            output::print_success(&format!("Exported {rows} audit entries to {path}"));
        }
    }

    Ok(())
}
