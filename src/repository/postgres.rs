use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{Repository, RepositoryError, TransactionFilter};
use crate::routes::auth::models::{PasswordResetModel, UserAccountModel};
use crate::routes::payment::models::{
    OrderModel, OrderStatusModel, OrderStatusUpdate, TransactionModel, WebhookLogModel,
};
use crate::schemas::PageRequest;

const TRANSACTION_COLUMNS: &str = r#"
    o.id AS collect_id, o.custom_order_id, o.collect_request_id, o.school_id, o.trustee_id,
    o.gateway_name, o.student_info, s.order_amount, s.transaction_amount, s.status,
    s.payment_mode, s.payment_details, s.bank_reference, s.payment_message, s.error_message,
    s.payment_time, o.created_at, s.updated_at
"#;

pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(entity: &str, err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            RepositoryError::Conflict(entity.to_string())
        }
        _ => {
            tracing::error!("Failed to execute query: {:?}", err);
            RepositoryError::Unexpected(
                anyhow::Error::new(err).context(format!("Failed to store {}", entity)),
            )
        }
    }
}

async fn insert_order_status(
    transaction: &mut Transaction<'_, Postgres>,
    status: &OrderStatusModel,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO order_status (id, collect_id, order_amount, transaction_amount, payment_mode,
            payment_details, bank_reference, payment_message, status, error_message, payment_time,
            version, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(status.id)
    .bind(status.collect_id)
    .bind(status.order_amount)
    .bind(status.transaction_amount)
    .bind(&status.payment_mode)
    .bind(&status.payment_details)
    .bind(&status.bank_reference)
    .bind(&status.payment_message)
    .bind(&status.status)
    .bind(&status.error_message)
    .bind(status.payment_time)
    .bind(status.version)
    .bind(status.created_at)
    .bind(status.updated_at)
    .execute(&mut **transaction)
    .await
    .map_err(|e| map_insert_error("Order status", e))?;
    Ok(())
}

#[async_trait]
impl Repository for PgRepository {
    #[tracing::instrument(name = "Fetch user by email", skip(self))]
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserAccountModel>, RepositoryError> {
        let user = sqlx::query_as::<_, UserAccountModel>(
            r#"
            SELECT id, email, password_hash, name, role, is_verified, otp, otp_expires_at,
                created_at, updated_at
            FROM user_account WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;
        Ok(user)
    }

    #[tracing::instrument(name = "Fetch user by id", skip(self))]
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserAccountModel>, RepositoryError> {
        let user = sqlx::query_as::<_, UserAccountModel>(
            r#"
            SELECT id, email, password_hash, name, role, is_verified, otp, otp_expires_at,
                created_at, updated_at
            FROM user_account WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by id")?;
        Ok(user)
    }

    #[tracing::instrument(name = "Store user account", skip(self, user), fields(user_id = %user.id))]
    async fn create_user(&self, user: &UserAccountModel) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO user_account (id, email, password_hash, name, role, is_verified, otp,
                otp_expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(user.is_verified)
        .bind(&user.otp)
        .bind(user.otp_expires_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error("User", e))?;
        Ok(())
    }

    #[tracing::instrument(name = "Store password reset", skip(self, reset))]
    async fn create_password_reset(
        &self,
        reset: &PasswordResetModel,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO password_reset (id, user_id, token_hash, expires_at, used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(reset.id)
        .bind(reset.user_id)
        .bind(&reset.token_hash)
        .bind(reset.expires_at)
        .bind(reset.used)
        .bind(reset.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error("Password reset", e))?;
        Ok(())
    }

    #[tracing::instrument(name = "Fetch password reset", skip(self, token_hash))]
    async fn find_password_reset_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetModel>, RepositoryError> {
        let reset = sqlx::query_as::<_, PasswordResetModel>(
            r#"
            SELECT id, user_id, token_hash, expires_at, used, created_at
            FROM password_reset WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch password reset")?;
        Ok(reset)
    }

    #[tracing::instrument(name = "Consume password reset", skip(self, password_hash))]
    async fn consume_password_reset(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .context("Failed to acquire a Postgres connection from the pool")?;
        let consumed = sqlx::query(
            r#"
            UPDATE password_reset SET used = TRUE
            WHERE id = $1 AND used = FALSE AND expires_at > $2
            "#,
        )
        .bind(reset_id)
        .bind(Utc::now())
        .execute(&mut *transaction)
        .await
        .context("Failed to mark password reset as used")?
        .rows_affected();
        if consumed == 0 {
            return Ok(false);
        }
        sqlx::query("UPDATE user_account SET password_hash = $1, updated_at = $2 WHERE id = $3")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&mut *transaction)
            .await
            .context("Failed to update password")?;
        transaction
            .commit()
            .await
            .context("Failed to commit SQL transaction to reset a password")?;
        Ok(true)
    }

    #[tracing::instrument(name = "Record password reset attempt", skip(self))]
    async fn record_password_reset_attempt(
        &self,
        email: &str,
        at: DateTime<Utc>,
    ) -> Result<i32, RepositoryError> {
        let count: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO password_reset_attempt (id, email, attempt_count, last_attempt_at)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (email) DO UPDATE
            SET attempt_count = password_reset_attempt.attempt_count + 1,
                last_attempt_at = EXCLUDED.last_attempt_at
            RETURNING attempt_count
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .context("Failed to record password reset attempt")?;
        Ok(count)
    }

    #[tracing::instrument(name = "Store order", skip(self, order, status), fields(order_id = %order.id))]
    async fn create_order_with_status(
        &self,
        order: &OrderModel,
        status: &OrderStatusModel,
    ) -> Result<(), RepositoryError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .context("Failed to acquire a Postgres connection from the pool")?;
        sqlx::query(
            r#"
            INSERT INTO orders (id, school_id, trustee_id, gateway_name, custom_order_id,
                collect_request_id, student_info, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id)
        .bind(&order.school_id)
        .bind(&order.trustee_id)
        .bind(&order.gateway_name)
        .bind(&order.custom_order_id)
        .bind(&order.collect_request_id)
        .bind(&order.student_info)
        .bind(order.user_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *transaction)
        .await
        .map_err(|e| map_insert_error("Order", e))?;
        insert_order_status(&mut transaction, status).await?;
        transaction
            .commit()
            .await
            .context("Failed to commit SQL transaction to store an order")?;
        Ok(())
    }

    #[tracing::instrument(name = "Store collect request id", skip(self))]
    async fn set_collect_request_id(
        &self,
        order_id: Uuid,
        collect_request_id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE orders SET collect_request_id = $1, updated_at = $2 WHERE id = $3")
            .bind(collect_request_id)
            .bind(Utc::now())
            .bind(order_id)
            .execute(&self.pool)
            .await
            .context("Failed to store collect request id")?;
        Ok(())
    }

    #[tracing::instrument(name = "Fetch order", skip(self))]
    async fn find_order(&self, order_id: Uuid) -> Result<Option<OrderModel>, RepositoryError> {
        let order = sqlx::query_as::<_, OrderModel>(
            r#"
            SELECT id, school_id, trustee_id, gateway_name, custom_order_id, collect_request_id,
                student_info, user_id, created_at, updated_at
            FROM orders WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch order")?;
        Ok(order)
    }

    #[tracing::instrument(name = "Fetch order status", skip(self))]
    async fn find_order_status(
        &self,
        collect_id: Uuid,
    ) -> Result<Option<OrderStatusModel>, RepositoryError> {
        let status = sqlx::query_as::<_, OrderStatusModel>(
            r#"
            SELECT id, collect_id, order_amount, transaction_amount, payment_mode, payment_details,
                bank_reference, payment_message, status, error_message, payment_time, version,
                created_at, updated_at
            FROM order_status WHERE collect_id = $1
            "#,
        )
        .bind(collect_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch order status")?;
        Ok(status)
    }

    #[tracing::instrument(name = "Update order status", skip(self, update))]
    async fn update_order_status(
        &self,
        collect_id: Uuid,
        expected_version: i64,
        update: &OrderStatusUpdate,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE order_status
            SET order_amount = $1, transaction_amount = $2, payment_mode = $3,
                payment_details = $4, bank_reference = $5, payment_message = $6, status = $7,
                error_message = $8, payment_time = $9, version = version + 1, updated_at = $10
            WHERE collect_id = $11 AND version = $12
            "#,
        )
        .bind(update.order_amount)
        .bind(update.transaction_amount)
        .bind(&update.payment_mode)
        .bind(&update.payment_details)
        .bind(&update.bank_reference)
        .bind(&update.payment_message)
        .bind(&update.status)
        .bind(&update.error_message)
        .bind(update.payment_time)
        .bind(Utc::now())
        .bind(collect_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .context("Failed to update order status")?;
        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(name = "Store webhook log", skip(self, log), fields(log_id = %log.id))]
    async fn insert_webhook_log(&self, log: &WebhookLogModel) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO webhook_log (id, payload, status, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(log.id)
        .bind(&log.payload)
        .bind(log.status)
        .bind(log.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error("Webhook log", e))?;
        Ok(())
    }

    #[tracing::instrument(name = "List transactions", skip(self))]
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<TransactionModel>, i64), RepositoryError> {
        let condition = r#"
            ($1::TEXT IS NULL OR o.school_id = $1) AND ($2::TEXT IS NULL OR s.status = $2)
        "#;
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM orders o JOIN order_status s ON s.collect_id = o.id WHERE {}",
            condition
        ))
        .bind(&filter.school_id)
        .bind(&filter.status)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count transactions")?;

        let rows = sqlx::query_as::<_, TransactionModel>(&format!(
            r#"
            SELECT {} FROM orders o JOIN order_status s ON s.collect_id = o.id
            WHERE {}
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $3 OFFSET $4
            "#,
            TRANSACTION_COLUMNS, condition
        ))
        .bind(&filter.school_id)
        .bind(&filter.status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;
        Ok((rows, total))
    }

    #[tracing::instrument(name = "Fetch transaction", skip(self))]
    async fn find_transaction_by_custom_order_id(
        &self,
        custom_order_id: &str,
    ) -> Result<Option<TransactionModel>, RepositoryError> {
        let row = sqlx::query_as::<_, TransactionModel>(&format!(
            r#"
            SELECT {} FROM orders o JOIN order_status s ON s.collect_id = o.id
            WHERE o.custom_order_id = $1
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(custom_order_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;
        Ok(row)
    }
}
