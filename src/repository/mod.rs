mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::GenericError;
use crate::routes::auth::models::{PasswordResetModel, UserAccountModel};
use crate::routes::payment::models::{
    OrderModel, OrderStatusModel, OrderStatusUpdate, TransactionModel, WebhookLogModel,
};
use crate::schemas::PageRequest;
use crate::utils::error_chain_fmt;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

#[derive(thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} already exists")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<RepositoryError> for GenericError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => GenericError::DuplicateError(err.to_string()),
            RepositoryError::Unexpected(error) => {
                GenericError::DatabaseError("Database request failed".to_string(), error)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub school_id: Option<String>,
    pub status: Option<String>,
}

/// Persistence collaborator shared by every request handler.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserAccountModel>, RepositoryError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserAccountModel>, RepositoryError>;

    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, user: &UserAccountModel) -> Result<(), RepositoryError>;

    async fn create_password_reset(&self, reset: &PasswordResetModel)
        -> Result<(), RepositoryError>;

    async fn find_password_reset_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetModel>, RepositoryError>;

    /// Marks the token used and stores the new password hash atomically.
    async fn consume_password_reset(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, RepositoryError>;

    async fn record_password_reset_attempt(
        &self,
        email: &str,
        at: DateTime<Utc>,
    ) -> Result<i32, RepositoryError>;

    /// Persists an order together with its initial status record.
    async fn create_order_with_status(
        &self,
        order: &OrderModel,
        status: &OrderStatusModel,
    ) -> Result<(), RepositoryError>;

    async fn set_collect_request_id(
        &self,
        order_id: Uuid,
        collect_request_id: &str,
    ) -> Result<(), RepositoryError>;

    async fn find_order(&self, order_id: Uuid) -> Result<Option<OrderModel>, RepositoryError>;

    async fn find_order_status(
        &self,
        collect_id: Uuid,
    ) -> Result<Option<OrderStatusModel>, RepositoryError>;

    /// Conditional update: applies only when the stored version still equals
    /// `expected_version`. Returns `false` when another writer got there first.
    async fn update_order_status(
        &self,
        collect_id: Uuid,
        expected_version: i64,
        update: &OrderStatusUpdate,
    ) -> Result<bool, RepositoryError>;

    async fn insert_webhook_log(&self, log: &WebhookLogModel) -> Result<(), RepositoryError>;

    /// Newest first, plus the total number of matching rows.
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<TransactionModel>, i64), RepositoryError>;

    async fn find_transaction_by_custom_order_id(
        &self,
        custom_order_id: &str,
    ) -> Result<Option<TransactionModel>, RepositoryError>;
}
