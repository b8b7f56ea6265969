use actix_web::{web, HttpResponse};

use super::schemas::{
    CreatePaymentRequest, CreatePaymentResponse, TransactionListData, TransactionQuery,
    TransactionView, WebhookAck, WebhookPayload,
};
use super::utils::{
    create_payment_order, fetch_transaction_status, fetch_transactions, process_webhook,
    read_webhook_body, reject_webhook_body,
};
use crate::configuration::{ApplicationSettings, PaymentGatewaySettings};
use crate::constants::WEBHOOK_MAX_BODY_BYTES;
use crate::email_client::GenericEmailService;
use crate::errors::GenericError;
use crate::payment_client::PaymentClient;
use crate::repository::{Repository, TransactionFilter};
use crate::routes::auth::schemas::UserAccount;
use crate::schemas::{EmptyGenericResponse, GenericResponse, PageRequest};

#[utoipa::path(
    post,
    path = "/api/payments/create",
    tag = "Payments",
    request_body(content = CreatePaymentRequest, description = "Request Body"),
    responses(
        (status=200, description= "Payment request created", body= GenericResponse<CreatePaymentResponse>),
        (status=400, description= "Validation failed", body= EmptyGenericResponse),
        (status=500, description= "Failed to create payment request", body= EmptyGenericResponse),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    err,
    name = "Create Payment API",
    skip(repository, payment_client, gateway_settings, application, body, user),
    fields(user_id = %user.id)
)]
pub async fn create_payment(
    body: CreatePaymentRequest,
    repository: web::Data<dyn Repository>,
    payment_client: web::Data<PaymentClient>,
    gateway_settings: web::Data<PaymentGatewaySettings>,
    application: web::Data<ApplicationSettings>,
    user: UserAccount,
) -> Result<web::Json<GenericResponse<CreatePaymentResponse>>, GenericError> {
    let data = create_payment_order(
        repository.get_ref(),
        &payment_client,
        &gateway_settings,
        &application.frontend_url,
        user.id,
        body,
    )
    .await?;
    Ok(web::Json(GenericResponse::success(
        "Payment request created successfully",
        Some(data),
    )))
}

/// Always answers 200 so the gateway does not retry; the outcome is in the body.
#[utoipa::path(
    post,
    path = "/api/payments/webhook",
    tag = "Payments",
    request_body(content = WebhookPayload, description = "Gateway notification"),
    responses(
        (status=200, description= "Webhook acknowledged", body= WebhookAck),
    )
)]
#[tracing::instrument(name = "Payment Webhook API", skip(repository, email_client, payload))]
pub async fn payment_webhook(
    mut payload: web::Payload,
    repository: web::Data<dyn Repository>,
    email_client: web::Data<dyn GenericEmailService>,
) -> HttpResponse {
    let ack = match read_webhook_body(&mut payload, WEBHOOK_MAX_BODY_BYTES).await {
        Ok(body) => process_webhook(repository.get_ref(), email_client.get_ref(), &body).await,
        Err(reason) => reject_webhook_body(repository.get_ref(), reason).await,
    };
    HttpResponse::Ok().json(ack)
}

#[utoipa::path(
    get,
    path = "/api/payments/transactions",
    tag = "Payments",
    params(TransactionQuery),
    responses(
        (status=200, description= "Paginated transactions", body= GenericResponse<TransactionListData>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "List Transactions API", skip(repository))]
pub async fn list_transactions(
    query: web::Query<TransactionQuery>,
    repository: web::Data<dyn Repository>,
) -> Result<web::Json<GenericResponse<TransactionListData>>, GenericError> {
    let query = query.into_inner();
    let filter = TransactionFilter {
        school_id: None,
        status: query.status.map(|s| s.trim().to_lowercase()),
    };
    let data = fetch_transactions(
        repository.get_ref(),
        filter,
        PageRequest::new(query.page, query.limit),
    )
    .await?;
    Ok(web::Json(GenericResponse::success(
        "Transactions fetched successfully",
        Some(data),
    )))
}

#[utoipa::path(
    get,
    path = "/api/payments/transactions/school/{school_id}",
    tag = "Payments",
    params(
        ("school_id" = String, Path, description = "School identifier"),
        TransactionQuery
    ),
    responses(
        (status=200, description= "Paginated transactions of one school", body= GenericResponse<TransactionListData>),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "List School Transactions API", skip(repository))]
pub async fn list_school_transactions(
    path: web::Path<String>,
    query: web::Query<TransactionQuery>,
    repository: web::Data<dyn Repository>,
) -> Result<web::Json<GenericResponse<TransactionListData>>, GenericError> {
    let query = query.into_inner();
    let filter = TransactionFilter {
        school_id: Some(path.into_inner()),
        status: query.status.map(|s| s.trim().to_lowercase()),
    };
    let data = fetch_transactions(
        repository.get_ref(),
        filter,
        PageRequest::new(query.page, query.limit),
    )
    .await?;
    Ok(web::Json(GenericResponse::success(
        "Transactions fetched successfully",
        Some(data),
    )))
}

#[utoipa::path(
    get,
    path = "/api/payments/status/{custom_order_id}",
    tag = "Payments",
    params(("custom_order_id" = String, Path, description = "Custom order id, e.g. ORD-1714032000000-1a2b3c4d")),
    responses(
        (status=200, description= "Transaction status", body= GenericResponse<TransactionView>),
        (status=404, description= "Transaction not found", body= EmptyGenericResponse),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(err, name = "Transaction Status API", skip(repository))]
pub async fn transaction_status(
    path: web::Path<String>,
    repository: web::Data<dyn Repository>,
) -> Result<web::Json<GenericResponse<TransactionView>>, GenericError> {
    let view = fetch_transaction_status(repository.get_ref(), &path).await?;
    Ok(web::Json(GenericResponse::success(
        "Transaction fetched successfully",
        Some(view),
    )))
}
