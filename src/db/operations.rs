use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::db::models::{ProfileUpdate, User};
use crate::db::store::UserStore;
use crate::error::{AppError, DatabaseError};
use crate::Result;

const USER_COLUMNS: &str = "id, username, email, password_hash, about_me, last_seen, created_at";

/// Postgres-backed user store.
pub struct PgUserStore {
    pool: Arc<PgPool>,
}

impl PgUserStore {
    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| AppError::DatabaseError(DatabaseError::ConnectionError(e.to_string())))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn create(&self, user: &User) -> Result<User> {
        let mut transaction = self.pool.begin().await?;

        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, about_me, last_seen, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.about_me)
        .bind(user.last_seen)
        .bind(user.created_at)
        .fetch_one(&mut *transaction)
        .await;

        match result {
            Ok(user) => {
                transaction.commit().await?;
                Ok(user)
            }
            Err(e) => {
                transaction.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET username = $1, about_me = $2 WHERE id = $3 RETURNING {USER_COLUMNS}"
        ))
        .bind(&update.username)
        .bind(&update.about_me)
        .bind(id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn touch_last_seen(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE users SET last_seen = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::QueryError(format!("no user {id} to mark as seen")).into());
        }
        Ok(())
    }
}
