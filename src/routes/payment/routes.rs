use actix_web::web;

use super::handlers::{
    create_payment, list_school_transactions, list_transactions, payment_webhook,
    transaction_status,
};
use crate::routes::auth::middlewares::RequireAuth;

pub fn payment_route(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/create")
            .route(web::post().to(create_payment))
            .wrap(RequireAuth),
    );
    cfg.service(web::resource("/webhook").route(web::post().to(payment_webhook)));
    cfg.service(
        web::resource("/transactions")
            .route(web::get().to(list_transactions))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/transactions/school/{school_id}")
            .route(web::get().to(list_school_transactions))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/status/{custom_order_id}")
            .route(web::get().to(transaction_status))
            .wrap(RequireAuth),
    );
}

/// Resource-style aliases of the payment endpoints.
pub fn transaction_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/webhook").route(web::post().to(payment_webhook)));
    cfg.service(
        web::resource("")
            .route(web::post().to(create_payment))
            .route(web::get().to(list_transactions))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/school/{school_id}")
            .route(web::get().to(list_school_transactions))
            .wrap(RequireAuth),
    );
    cfg.service(
        web::resource("/{custom_order_id}")
            .route(web::get().to(transaction_status))
            .wrap(RequireAuth),
    );
}
