use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::models::TransactionModel;
use crate::schemas::{impl_json_request, PaginationMeta};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StudentInfo {
    pub name: String,
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "webhook_log_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WebhookLogStatus {
    Received,
    Rejected,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[validate(length(min = 1, message = "Student name is required"))]
    pub student_name: String,
    #[validate(length(min = 1, message = "Student id is required"))]
    pub student_id: String,
    #[validate(email(message = "Invalid student email"))]
    pub student_email: String,
    #[validate(range(exclusive_min = 0.0, message = "Amount must be greater than 0"))]
    pub amount: f64,
}
impl_json_request!(CreatePaymentRequest);

#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub order_id: Uuid,
    pub custom_order_id: String,
    pub collect_request_id: String,
    pub redirect_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleAmount {
    Number(f64),
    Text(String),
}

/// Gateway amounts arrive either as JSON numbers or as numeric strings.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match FlexibleAmount::deserialize(deserializer)? {
        FlexibleAmount::Number(value) => Ok(value),
        FlexibleAmount::Text(value) => value
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount: {}", value))),
    }
}

fn validate_amount(value: f64) -> Result<(), validator::ValidationError> {
    if !value.is_finite() || value < 0.0 {
        let mut error = validator::ValidationError::new("amount");
        error.message = Some("Amount must be a non-negative number".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct WebhookOrderInfo {
    #[validate(length(min = 1, message = "order_id is required"))]
    pub order_id: String,
    #[serde(deserialize_with = "deserialize_amount")]
    #[validate(custom(function = "validate_amount"))]
    pub order_amount: f64,
    #[serde(deserialize_with = "deserialize_amount")]
    #[validate(custom(function = "validate_amount"))]
    pub transaction_amount: f64,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub bank_reference: String,
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
    #[serde(default)]
    pub payment_mode: String,
    #[serde(default, alias = "payemnt_details")]
    pub payment_details: String,
    #[serde(default, alias = "Payment_message")]
    pub payment_message: String,
    #[serde(default)]
    pub payment_time: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct WebhookPayload {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub status: serde_json::Value,
    #[validate(nested)]
    pub order_info: WebhookOrderInfo,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, ToSchema)]
pub struct WebhookAck {
    pub success: bool,
    pub message: String,
}

impl WebhookAck {
    pub fn processed() -> Self {
        Self {
            success: true,
            message: "Webhook processed successfully".to_string(),
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    /// Page number, starting at 1.
    pub page: Option<i64>,
    /// Page size, at most 100.
    pub limit: Option<i64>,
    /// Filter by lower-case status, e.g. `success`.
    pub status: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub collect_id: Uuid,
    pub custom_order_id: Option<String>,
    pub collect_request_id: Option<String>,
    pub school_id: String,
    pub trustee_id: Option<String>,
    pub gateway: String,
    pub student_info: StudentInfo,
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

impl From<TransactionModel> for TransactionView {
    fn from(model: TransactionModel) -> Self {
        Self {
            collect_id: model.collect_id,
            custom_order_id: model.custom_order_id,
            collect_request_id: model.collect_request_id,
            school_id: model.school_id,
            trustee_id: model.trustee_id,
            gateway: model.gateway_name,
            student_info: model.student_info.0,
            order_amount: model.order_amount,
            transaction_amount: model.transaction_amount,
            status: model.status,
            payment_mode: model.payment_mode,
            payment_details: model.payment_details,
            bank_reference: model.bank_reference,
            payment_message: model.payment_message,
            error_message: model.error_message,
            payment_time: model.payment_time,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct TransactionListData {
    pub transactions: Vec<TransactionView>,
    pub pagination: PaginationMeta,
}
