//! User management CLI commands.

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use warehouse_auth::{ClaimsCodec, PasswordHasher};
use warehouse_core::config::AppConfig;
use warehouse_database::{PgUserStore, RetryPolicy, UserStore};
use warehouse_entity::user::{User, UserRole};
use warehouse_service::IdentityService;

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user
    Create {
        /// Username
        username: String,
        /// Role: admin, manager, or viewer
        #[arg(short, long, default_value = "viewer")]
        role: UserRole,
        /// Password; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// List all users
    List,
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User ID
    id: String,
    /// Username
    username: String,
    /// Role
    role: String,
    /// Created at
    created_at: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            username: u.username.clone(),
            role: u.role.to_string(),
            created_at: u.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    cancel: &CancellationToken,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let db = super::connect(config, cancel).await?;
    let users = Arc::new(PgUserStore::new(
        db.pool().clone(),
        RetryPolicy::from_config(&config.retry),
    ));

    match &args.command {
        UserCommand::Create {
            username,
            role,
            password,
        } => {
            let password = match password {
                Some(p) => p.clone(),
                None => dialoguer::Password::new()
                    .with_prompt(format!("Password for '{username}'"))
                    .with_confirmation("Repeat password", "Passwords do not match")
                    .interact()
                    .context("Failed to read password")?,
            };

            let hasher = Arc::new(PasswordHasher::new());
            let identity = IdentityService::new(
                users,
                Arc::new(ClaimsCodec::new(&config.auth)),
                hasher.clone(),
                hasher,
            );
            let user = identity
                .register_user(cancel, username, &password, *role)
                .await
                .with_context(|| format!("Failed to create user '{username}'"))?;

            output::print_success(&format!("User '{}' created as {}", user.username, user.role));
            output::print_kv("ID", &user.id.to_string());
        }
        UserCommand::List => {
            let rows: Vec<UserRow> = users
                .list(cancel)
                .await
                .context("Failed to list users")?
                .iter()
                .map(UserRow::from)
                .collect();
            output::print_list(&rows, format);
        }
    }

    db.close().await;
    Ok(())
}
