use actix_web::web;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use sqlx::types::Json;
use uuid::Uuid;

use super::errors::PaymentOrderError;
use super::models::{OrderModel, OrderStatusModel, OrderStatusUpdate, WebhookLogModel};
use super::schemas::{
    CreatePaymentRequest, CreatePaymentResponse, StudentInfo, TransactionListData,
    TransactionView, WebhookAck, WebhookLogStatus, WebhookOrderInfo, WebhookPayload,
};
use crate::configuration::PaymentGatewaySettings;
use crate::constants::{
    GATEWAY_EMPTY_VALUE, PENDING_STATUS, STATUS_UPDATE_MAX_ATTEMPTS, SUCCESS_STATUS,
};
use crate::email_client::GenericEmailService;
use crate::email_templates::{payment_confirmation_email, PaymentReceipt};
use crate::payment_client::PaymentClient;
use crate::repository::{Repository, TransactionFilter};
use crate::schemas::{PageRequest, PaginationMeta};
use crate::utils::generate_custom_order_id;

pub fn callback_url(frontend_url: &str, custom_order_id: &str) -> String {
    format!(
        "{}/payment/callback?order_id={}",
        frontend_url, custom_order_id
    )
}

#[tracing::instrument(
    name = "Create payment order",
    skip(repository, payment_client, gateway_settings, body),
    fields(custom_order_id = tracing::field::Empty)
)]
pub async fn create_payment_order(
    repository: &dyn Repository,
    payment_client: &PaymentClient,
    gateway_settings: &PaymentGatewaySettings,
    frontend_url: &str,
    user_id: Uuid,
    body: CreatePaymentRequest,
) -> Result<CreatePaymentResponse, PaymentOrderError> {
    let now = Utc::now();
    let custom_order_id = generate_custom_order_id();
    tracing::Span::current().record("custom_order_id", custom_order_id.as_str());

    let order = OrderModel {
        id: Uuid::new_v4(),
        school_id: payment_client.school_id().to_string(),
        trustee_id: gateway_settings.trustee_id.clone(),
        gateway_name: gateway_settings.gateway_name.clone(),
        custom_order_id: Some(custom_order_id.clone()),
        collect_request_id: None,
        student_info: Json(StudentInfo {
            name: body.student_name.trim().to_string(),
            id: body.student_id.trim().to_string(),
            email: body.student_email.trim().to_lowercase(),
        }),
        user_id,
        created_at: now,
        updated_at: now,
    };
    let status = OrderStatusModel {
        id: Uuid::new_v4(),
        collect_id: order.id,
        order_amount: body.amount,
        transaction_amount: body.amount,
        payment_mode: String::new(),
        payment_details: String::new(),
        bank_reference: String::new(),
        payment_message: String::new(),
        status: PENDING_STATUS.to_string(),
        error_message: None,
        payment_time: None,
        version: 0,
        created_at: now,
        updated_at: now,
    };
    repository.create_order_with_status(&order, &status).await?;

    // The pending order stays in place when the gateway call fails.
    let collect_request = payment_client
        .create_collect_request(body.amount, &callback_url(frontend_url, &custom_order_id))
        .await
        .map_err(|e| {
            tracing::error!("Failed to create collect request: {:?}", e);
            PaymentOrderError::GatewayError(e)
        })?;
    repository
        .set_collect_request_id(order.id, &collect_request.collect_request_id)
        .await?;

    Ok(CreatePaymentResponse {
        order_id: order.id,
        custom_order_id,
        collect_request_id: collect_request.collect_request_id,
        redirect_url: collect_request.collect_request_url,
    })
}

fn normalize_error_message(error_message: Option<String>) -> Option<String> {
    error_message
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty() && message != GATEWAY_EMPTY_VALUE)
}

fn parse_payment_time(payment_time: Option<&str>) -> Option<DateTime<Utc>> {
    let value = payment_time?.trim();
    if value.is_empty() || value == GATEWAY_EMPTY_VALUE {
        return None;
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(time) => Some(time.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!("Ignoring unparseable payment_time {}: {}", value, e);
            None
        }
    }
}

pub fn build_status_update(order_info: &WebhookOrderInfo) -> OrderStatusUpdate {
    OrderStatusUpdate {
        order_amount: order_info.order_amount,
        transaction_amount: order_info.transaction_amount,
        payment_mode: order_info.payment_mode.clone(),
        payment_details: order_info.payment_details.clone(),
        bank_reference: order_info.bank_reference.clone(),
        payment_message: order_info.payment_message.clone(),
        status: order_info.status.trim().to_lowercase(),
        error_message: normalize_error_message(order_info.error_message.clone()),
        payment_time: parse_payment_time(order_info.payment_time.as_deref()),
    }
}

type RejectedWebhook = (serde_json::Value, String);

fn parse_webhook(raw: &[u8]) -> Result<(serde_json::Value, WebhookPayload), RejectedWebhook> {
    let value: serde_json::Value = serde_json::from_slice(raw).map_err(|e| {
        (
            serde_json::Value::String(String::from_utf8_lossy(raw).into_owned()),
            format!("Malformed JSON: {}", e),
        )
    })?;
    let payload = match serde_json::from_value::<WebhookPayload>(value.clone()) {
        Ok(payload) => payload,
        Err(e) => return Err((value, format!("Invalid payload: {}", e))),
    };
    if let Err(e) = validator::Validate::validate(&payload) {
        return Err((value, format!("Invalid payload: {}", e)));
    }
    Ok((value, payload))
}

async fn log_webhook(
    repository: &dyn Repository,
    payload: serde_json::Value,
    status: WebhookLogStatus,
) {
    let log = WebhookLogModel {
        id: Uuid::new_v4(),
        payload: Json(payload),
        status,
        created_at: Utc::now(),
    };
    if let Err(e) = repository.insert_webhook_log(&log).await {
        tracing::error!("Failed to store webhook log: {:?}", e);
    }
}

/// Applies the update against the latest version, re-reading on a version conflict.
async fn apply_status_update(
    repository: &dyn Repository,
    collect_id: Uuid,
    update: &OrderStatusUpdate,
) -> Result<bool, anyhow::Error> {
    for attempt in 1..=STATUS_UPDATE_MAX_ATTEMPTS {
        let current = match repository.find_order_status(collect_id).await? {
            Some(current) => current,
            None => return Ok(false),
        };
        if repository
            .update_order_status(collect_id, current.version, update)
            .await?
        {
            return Ok(true);
        }
        tracing::warn!(
            "Order status version conflict on attempt {} for {}",
            attempt,
            collect_id
        );
    }
    Err(anyhow::anyhow!(
        "Order status update lost {} version races",
        STATUS_UPDATE_MAX_ATTEMPTS
    ))
}

async fn send_payment_confirmation(
    email_client: &dyn GenericEmailService,
    order: &OrderModel,
    update: &OrderStatusUpdate,
) {
    let order_id = order
        .custom_order_id
        .clone()
        .unwrap_or_else(|| order.id.to_string());
    let message = payment_confirmation_email(&PaymentReceipt {
        student_name: &order.student_info.name,
        order_id: &order_id,
        amount: update.transaction_amount,
        payment_mode: &update.payment_mode,
        bank_reference: &update.bank_reference,
    });
    if let Err(e) = email_client
        .send_html_email(
            &order.student_info.email,
            &message.subject,
            message.html,
            message.text,
        )
        .await
    {
        tracing::error!("Failed to send payment confirmation email: {:?}", e);
    }
}

async fn reconcile(
    repository: &dyn Repository,
    email_client: &dyn GenericEmailService,
    payload: WebhookPayload,
) -> Result<WebhookAck, anyhow::Error> {
    let order_id = match Uuid::parse_str(payload.order_info.order_id.trim()) {
        Ok(order_id) => order_id,
        Err(_) => {
            tracing::warn!("Webhook references unknown order {}", payload.order_info.order_id);
            return Ok(WebhookAck::failed("Order not found"));
        }
    };
    let order = match repository.find_order(order_id).await? {
        Some(order) => order,
        None => {
            tracing::warn!("Webhook references unknown order {}", order_id);
            return Ok(WebhookAck::failed("Order not found"));
        }
    };

    let update = build_status_update(&payload.order_info);
    if !apply_status_update(repository, order.id, &update).await? {
        tracing::warn!("Order {} has no status record", order.id);
        return Ok(WebhookAck::failed("Order status not found"));
    }
    tracing::info!("Order {} moved to status {}", order.id, update.status);

    if update.status == SUCCESS_STATUS {
        send_payment_confirmation(email_client, &order, &update).await;
    }
    Ok(WebhookAck::processed())
}

/// Reads the notification body, giving up once it grows past `limit` bytes.
pub async fn read_webhook_body(
    payload: &mut web::Payload,
    limit: usize,
) -> Result<web::BytesMut, String> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| format!("Failed to read webhook body: {}", e))?;
        if body.len() + chunk.len() > limit {
            return Err(format!("Webhook body exceeds {} bytes", limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[tracing::instrument(name = "Reject unreadable webhook", skip(repository))]
pub async fn reject_webhook_body(repository: &dyn Repository, reason: String) -> WebhookAck {
    tracing::warn!("Rejected webhook: {}", reason);
    log_webhook(
        repository,
        serde_json::json!({ "error": reason }),
        WebhookLogStatus::Rejected,
    )
    .await;
    WebhookAck::failed("Invalid webhook payload")
}

/// Never fails: every outcome is reported through the acknowledgement body.
#[tracing::instrument(name = "Process payment webhook", skip(repository, email_client, raw))]
pub async fn process_webhook(
    repository: &dyn Repository,
    email_client: &dyn GenericEmailService,
    raw: &[u8],
) -> WebhookAck {
    let payload = match parse_webhook(raw) {
        Ok((value, payload)) => {
            log_webhook(repository, value, WebhookLogStatus::Received).await;
            payload
        }
        Err((value, reason)) => {
            tracing::warn!("Rejected webhook: {}", reason);
            log_webhook(repository, value, WebhookLogStatus::Rejected).await;
            return WebhookAck::failed("Invalid webhook payload");
        }
    };

    match reconcile(repository, email_client, payload).await {
        Ok(ack) => ack,
        Err(e) => {
            tracing::error!("Failed to process webhook: {:?}", e);
            WebhookAck::failed("Failed to process webhook")
        }
    }
}

#[tracing::instrument(name = "List transactions", skip(repository))]
pub async fn fetch_transactions(
    repository: &dyn Repository,
    filter: TransactionFilter,
    page: PageRequest,
) -> Result<TransactionListData, PaymentOrderError> {
    let (rows, total) = repository.list_transactions(&filter, page).await?;
    Ok(TransactionListData {
        transactions: rows.into_iter().map(TransactionView::from).collect(),
        pagination: PaginationMeta::new(total, page),
    })
}

#[tracing::instrument(name = "Fetch transaction status", skip(repository))]
pub async fn fetch_transaction_status(
    repository: &dyn Repository,
    custom_order_id: &str,
) -> Result<TransactionView, PaymentOrderError> {
    repository
        .find_transaction_by_custom_order_id(custom_order_id)
        .await?
        .map(TransactionView::from)
        .ok_or(PaymentOrderError::NotFoundError)
}
