//! PostgreSQL user store.

use async_trait::async_trait;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use warehouse_core::AppResult;
use warehouse_entity::user::{CreateUser, User};

use crate::retry::RetryPolicy;
use crate::stores::UserStore;

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at, updated_at";

/// User store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgUserStore {
    /// Create a new user store.
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, cancel: &CancellationToken, username: &str) -> AppResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");

        self.retry
            .run("UserStore.find_by_username", cancel, || {
                let query = sqlx::query_as::<_, User>(&sql).bind(username);
                async move { query.fetch_one(&self.pool).await }
            })
            .await
    }

    async fn list(&self, cancel: &CancellationToken) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");

        self.retry
            .run("UserStore.list", cancel, || {
                let query = sqlx::query_as::<_, User>(&sql);
                async move { query.fetch_all(&self.pool).await }
            })
            .await
    }

    async fn create(&self, cancel: &CancellationToken, input: &CreateUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (id, username, password_hash, role) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        let id = Uuid::now_v7();

        let user = self
            .retry
            .run("UserStore.create", cancel, || {
                let query = sqlx::query_as::<_, User>(&sql)
                    .bind(id)
                    .bind(&input.username)
                    .bind(&input.password_hash)
                    .bind(input.role);
                async move { query.fetch_one(&self.pool).await }
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
        Ok(user)
    }
}
