use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::schemas::{StudentInfo, WebhookLogStatus};

#[derive(Debug, Clone, FromRow)]
pub struct OrderModel {
    pub id: Uuid,
    pub school_id: String,
    pub trustee_id: Option<String>,
    pub gateway_name: String,
    pub custom_order_id: Option<String>,
    pub collect_request_id: Option<String>,
    pub student_info: Json<StudentInfo>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderStatusModel {
    pub id: Uuid,
    pub collect_id: Uuid,
    pub order_amount: f64,
    pub transaction_amount: f64,
    pub payment_mode: String,
    pub payment_details: String,
    pub bank_reference: String,
    pub payment_message: String,
    pub status: String,
    pub error_message: Option<String>,
    pub payment_time: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of an order status overwritten by a gateway notification.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusUpdate {
    pub order_amount: f64,
    pub transaction_amount: f64,
    pub payment_mode: String,
    pub payment_details: String,
    pub bank_reference: String,
    pub payment_message: String,
    pub status: String,
    pub error_message: Option<String>,
    pub payment_time: Option<DateTime<Utc>>,
}

impl OrderStatusModel {
    pub fn apply(&mut self, update: &OrderStatusUpdate, now: DateTime<Utc>) {
        self.order_amount = update.order_amount;
        self.transaction_amount = update.transaction_amount;
        self.payment_mode = update.payment_mode.clone();
        self.payment_details = update.payment_details.clone();
        self.bank_reference = update.bank_reference.clone();
        self.payment_message = update.payment_message.clone();
        self.status = update.status.clone();
        self.error_message = update.error_message.clone();
        self.payment_time = update.payment_time;
        self.version += 1;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct WebhookLogModel {
    pub id: Uuid,
    pub payload: Json<serde_json::Value>,
    pub status: WebhookLogStatus,
    pub created_at: DateTime<Utc>,
}

/// Read-side join of an order with its status record.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionModel {
    pub collect_id: Uuid,
    pub custom_order_id: Option<String>,
    pub collect_request_id: Option<String>,
    pub school_id: String,
    pub trustee_id: Option<String>,
    pub gateway_name: String,
    pub student_info: Json<StudentInfo>,
    pub order_amount: f64,
    pub transaction_amount: f64,
    pub status: String,
    pub payment_mode: String,
    pub payment_details: String,
    pub bank_reference: String,
    pub payment_message: String,
    pub error_message: Option<String>,
    pub payment_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionModel {
    pub fn from_parts(order: &OrderModel, status: &OrderStatusModel) -> Self {
        Self {
            collect_id: order.id,
            custom_order_id: order.custom_order_id.clone(),
            collect_request_id: order.collect_request_id.clone(),
            school_id: order.school_id.clone(),
            trustee_id: order.trustee_id.clone(),
            gateway_name: order.gateway_name.clone(),
            student_info: order.student_info.clone(),
            order_amount: status.order_amount,
            transaction_amount: status.transaction_amount,
            status: status.status.clone(),
            payment_mode: status.payment_mode.clone(),
            payment_details: status.payment_details.clone(),
            bank_reference: status.bank_reference.clone(),
            payment_message: status.payment_message.clone(),
            error_message: status.error_message.clone(),
            payment_time: status.payment_time,
            created_at: order.created_at,
            updated_at: status.updated_at,
        }
    }
}
