//! CLI command definitions and dispatch.

pub mod audit;
pub mod migrate;
pub mod user;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use warehouse_core::config::AppConfig;
use warehouse_database::{DatabasePool, RetryPolicy};

use crate::output::OutputFormat;

/// Warehouse Control administration
#[derive(Debug, Parser)]
#[command(name = "warehouse-cli", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file, without extension
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from `config/<env>`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// User management
    User(user::UserArgs),
    /// Audit trail
    Audit(audit::AuditArgs),
}

impl Cli {
    /// Overlay file for the selected environment, without extension.
    pub fn overlay(&self) -> String {
        format!("config/{}", self.env)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> anyhow::Result<()> {
        let config = AppConfig::load_from(&self.config, &self.overlay())
            .context("Failed to load configuration")?;
        let cancel = cancel_on_ctrl_c();

        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config, &cancel, self.format).await,
            Commands::User(args) => user::execute(args, &config, &cancel, self.format).await,
            Commands::Audit(args) => audit::execute(args, &config, &cancel).await,
        }
    }
}

/// Open the connection pool described by `config`.
pub async fn connect(config: &AppConfig, cancel: &CancellationToken) -> anyhow::Result<DatabasePool> {
    DatabasePool::connect(
        &config.database,
        &RetryPolicy::from_config(&config.retry),
        cancel,
    )
    .await
    .context("Failed to connect to database")
}

/// A token that fires on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}
