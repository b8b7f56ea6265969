use actix_web::web;

use super::handlers::{health_check, openapi_document};

pub fn util_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/api-docs/openapi.json", web::get().to(openapi_document));
}
