use async_trait::async_trait;

use crate::error::AppError;
use crate::models::account::{Account, AccountChanges};

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create_account(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<Account, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;
    async fn update_account(&self, id: i64, changes: &AccountChanges)
        -> Result<Account, AppError>;

    /// Return the account's token, storing `fresh_key` first if it has none.
    async fn get_or_create_token(&self, account_id: i64, fresh_key: &str)
        -> Result<String, AppError>;
    async fn find_by_token(&self, key: &str) -> Result<Option<Account>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
