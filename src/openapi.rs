use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::routes::auth::schemas::{AuthData, UserAccount, UserRole};
use crate::routes::payment::schemas::{
    CreatePaymentResponse, StudentInfo, TransactionListData, TransactionView, WebhookAck,
};
use crate::routes::util::schemas::HealthStatus;
use crate::schemas::{EmptyGenericResponse, PaginationMeta};

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::util::handlers::health_check,
        crate::routes::auth::handlers::register,
        crate::routes::auth::handlers::login,
        crate::routes::auth::handlers::forgot_password,
        crate::routes::auth::handlers::reset_password_handler,
        crate::routes::auth::handlers::profile,
        crate::routes::payment::handlers::create_payment,
        crate::routes::payment::handlers::payment_webhook,
        crate::routes::payment::handlers::list_transactions,
        crate::routes::payment::handlers::list_school_transactions,
        crate::routes::payment::handlers::transaction_status,
    ),
    components(schemas(
        AuthData,
        UserAccount,
        UserRole,
        StudentInfo,
        CreatePaymentResponse,
        TransactionView,
        TransactionListData,
        PaginationMeta,
        WebhookAck,
        HealthStatus,
        EmptyGenericResponse
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "Auth", description = "Account registration, login and password recovery"),
        (name = "Payments", description = "Fee collection requests, gateway webhooks and transaction lookups"),
        (name = "Utility", description = "Service health")
    ),
)]
pub struct ApiDoc;
