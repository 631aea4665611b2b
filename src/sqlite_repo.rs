use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::account::{Account, AccountChanges};
use crate::repository::AccountRepository;
use crate::util::{now_millis, token_prefix};

const ACCOUNT_COLUMNS: &str = "id, email, name, password_hash, created_at";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for SqliteRepository {
    async fn create_account(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<Account, AppError> {
        tracing::debug!("db: INSERT users");

        let account: Account = sqlx::query_as(&format!(
            "INSERT INTO users (email, name, password_hash, created_at) VALUES (?, ?, ?, ?) \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(user_id = account.id, "db: user row inserted");

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        tracing::debug!("db: SELECT user by email");

        let account: Option<Account> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(found = account.is_some(), "db: user lookup result");

        Ok(account)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        tracing::debug!("db: SELECT 1 (email exists check)");

        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(exists.is_some())
    }

    async fn update_account(
        &self,
        id: i64,
        changes: &AccountChanges,
    ) -> Result<Account, AppError> {
        tracing::debug!(
            user_id = id,
            email = changes.email.is_some(),
            name = changes.name.is_some(),
            password = changes.password_hash.is_some(),
            "db: UPDATE users (partial)"
        );

        let account: Option<Account> = sqlx::query_as(&format!(
            "UPDATE users SET \
             email = COALESCE(?, email), \
             name = COALESCE(?, name), \
             password_hash = COALESCE(?, password_hash) \
             WHERE id = ? RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(changes.email.as_deref())
        .bind(changes.name.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        account.ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn get_or_create_token(
        &self,
        account_id: i64,
        fresh_key: &str,
    ) -> Result<String, AppError> {
        tracing::debug!(user_id = account_id, "db: INSERT auth_tokens (if absent)");

        let result = sqlx::query(
            "INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(fresh_key)
        .bind(account_id)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;

        let (key,): (String,) = sqlx::query_as("SELECT key FROM auth_tokens WHERE user_id = ?")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(
            user_id = account_id,
            created = result.rows_affected() > 0,
            token = %token_prefix(&key),
            "db: token resolved"
        );

        Ok(key)
    }

    async fn find_by_token(&self, key: &str) -> Result<Option<Account>, AppError> {
        tracing::debug!(token = %token_prefix(key), "db: SELECT user by token");

        let account: Option<Account> = sqlx::query_as(
            "SELECT u.id, u.email, u.name, u.password_hash, u.created_at \
             FROM users u JOIN auth_tokens t ON t.user_id = u.id WHERE t.key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(
            token = %token_prefix(key),
            found = account.is_some(),
            "db: token lookup result"
        );

        Ok(account)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
