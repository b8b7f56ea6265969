use actix_web::{web, HttpResponse};
use utoipa::OpenApi;

use super::schemas::HealthStatus;
use crate::configuration::ApplicationSettings;
use crate::openapi::ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Utility",
    responses(
        (status=200, description= "Service is up", body= HealthStatus),
    )
)]
#[tracing::instrument(name = "Health Check API", skip(application))]
pub async fn health_check(application: web::Data<ApplicationSettings>) -> HttpResponse {
    HttpResponse::Ok().json(HealthStatus {
        status: "ok".to_string(),
        environment: application.environment.to_string(),
    })
}

pub async fn openapi_document() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
