use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Repository, RepositoryError, TransactionFilter};
use crate::routes::auth::models::{
    PasswordResetAttemptModel, PasswordResetModel, UserAccountModel,
};
use crate::routes::payment::models::{
    OrderModel, OrderStatusModel, OrderStatusUpdate, TransactionModel, WebhookLogModel,
};
use crate::schemas::PageRequest;

#[derive(Default)]
struct Store {
    users: Vec<UserAccountModel>,
    password_resets: Vec<PasswordResetModel>,
    password_reset_attempts: Vec<PasswordResetAttemptModel>,
    orders: Vec<OrderModel>,
    order_statuses: Vec<OrderStatusModel>,
    webhook_logs: Vec<WebhookLogModel>,
}

/// Process-local store backing the unit and API tests.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, RepositoryError> {
        self.store
            .lock()
            .map_err(|_| RepositoryError::Unexpected(anyhow::anyhow!("In-memory store poisoned")))
    }

    pub fn webhook_logs(&self) -> Vec<WebhookLogModel> {
        self.lock().map(|s| s.webhook_logs.clone()).unwrap_or_default()
    }

    pub fn password_reset_attempts(&self, email: &str) -> i32 {
        self.lock()
            .ok()
            .and_then(|s| {
                s.password_reset_attempts
                    .iter()
                    .find(|a| a.email == email)
                    .map(|a| a.attempt_count)
            })
            .unwrap_or(0)
    }

    pub fn password_resets(&self) -> Vec<PasswordResetModel> {
        self.lock()
            .map(|s| s.password_resets.clone())
            .unwrap_or_default()
    }
}

fn join_transaction(store: &Store, order: &OrderModel) -> Option<TransactionModel> {
    store
        .order_statuses
        .iter()
        .find(|s| s.collect_id == order.id)
        .map(|status| TransactionModel::from_parts(order, status))
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserAccountModel>, RepositoryError> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserAccountModel>, RepositoryError> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: &UserAccountModel) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        if store.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("User".to_string()));
        }
        store.users.push(user.clone());
        Ok(())
    }

    async fn create_password_reset(
        &self,
        reset: &PasswordResetModel,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        if store
            .password_resets
            .iter()
            .any(|r| r.token_hash == reset.token_hash)
        {
            return Err(RepositoryError::Conflict("Password reset".to_string()));
        }
        store.password_resets.push(reset.clone());
        Ok(())
    }

    async fn find_password_reset_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetModel>, RepositoryError> {
        Ok(self
            .lock()?
            .password_resets
            .iter()
            .find(|r| r.token_hash == token_hash)
            .cloned())
    }

    async fn consume_password_reset(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let mut store = self.lock()?;
        let now = Utc::now();
        match store
            .password_resets
            .iter_mut()
            .find(|r| r.id == reset_id && r.is_usable(now))
        {
            Some(reset) => reset.used = true,
            None => return Ok(false),
        }
        if let Some(user) = store.users.iter_mut().find(|u| u.id == user_id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = now;
        }
        Ok(true)
    }

    async fn record_password_reset_attempt(
        &self,
        email: &str,
        at: DateTime<Utc>,
    ) -> Result<i32, RepositoryError> {
        let mut store = self.lock()?;
        if let Some(attempt) = store
            .password_reset_attempts
            .iter_mut()
            .find(|a| a.email == email)
        {
            attempt.attempt_count += 1;
            attempt.last_attempt_at = at;
            return Ok(attempt.attempt_count);
        }
        store.password_reset_attempts.push(PasswordResetAttemptModel {
            id: Uuid::new_v4(),
            email: email.to_string(),
            attempt_count: 1,
            last_attempt_at: at,
        });
        Ok(1)
    }

    async fn create_order_with_status(
        &self,
        order: &OrderModel,
        status: &OrderStatusModel,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        if order.custom_order_id.is_some()
            && store
                .orders
                .iter()
                .any(|o| o.custom_order_id == order.custom_order_id)
        {
            return Err(RepositoryError::Conflict("Order".to_string()));
        }
        store.orders.push(order.clone());
        store.order_statuses.push(status.clone());
        Ok(())
    }

    async fn set_collect_request_id(
        &self,
        order_id: Uuid,
        collect_request_id: &str,
    ) -> Result<(), RepositoryError> {
        let mut store = self.lock()?;
        if let Some(order) = store.orders.iter_mut().find(|o| o.id == order_id) {
            order.collect_request_id = Some(collect_request_id.to_string());
            order.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_order(&self, order_id: Uuid) -> Result<Option<OrderModel>, RepositoryError> {
        Ok(self
            .lock()?
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned())
    }

    async fn find_order_status(
        &self,
        collect_id: Uuid,
    ) -> Result<Option<OrderStatusModel>, RepositoryError> {
        Ok(self
            .lock()?
            .order_statuses
            .iter()
            .find(|s| s.collect_id == collect_id)
            .cloned())
    }

    async fn update_order_status(
        &self,
        collect_id: Uuid,
        expected_version: i64,
        update: &OrderStatusUpdate,
    ) -> Result<bool, RepositoryError> {
        let mut store = self.lock()?;
        match store
            .order_statuses
            .iter_mut()
            .find(|s| s.collect_id == collect_id && s.version == expected_version)
        {
            Some(status) => {
                status.apply(update, Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_webhook_log(&self, log: &WebhookLogModel) -> Result<(), RepositoryError> {
        self.lock()?.webhook_logs.push(log.clone());
        Ok(())
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<TransactionModel>, i64), RepositoryError> {
        let store = self.lock()?;
        let mut rows: Vec<TransactionModel> = store
            .orders
            .iter()
            .filter(|o| {
                filter
                    .school_id
                    .as_ref()
                    .map_or(true, |school_id| &o.school_id == school_id)
            })
            .filter_map(|o| join_transaction(&store, o))
            .filter(|t| {
                filter
                    .status
                    .as_ref()
                    .map_or(true, |status| &t.status == status)
            })
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.collect_id.cmp(&a.collect_id))
        });
        let total = rows.len() as i64;
        let page_rows = rows
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .collect();
        Ok((page_rows, total))
    }

    async fn find_transaction_by_custom_order_id(
        &self,
        custom_order_id: &str,
    ) -> Result<Option<TransactionModel>, RepositoryError> {
        let store = self.lock()?;
        Ok(store
            .orders
            .iter()
            .find(|o| o.custom_order_id.as_deref() == Some(custom_order_id))
            .and_then(|o| join_transaction(&store, o)))
    }
}
