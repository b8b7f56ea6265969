use actix_web::web;

use crate::routes::{auth_route, payment_route, transaction_route, util_route};

pub fn main_route(cfg: &mut web::ServiceConfig) {
    cfg.configure(util_route)
        .service(web::scope("/api/auth").configure(auth_route))
        .service(web::scope("/api/payments").configure(payment_route))
        .service(web::scope("/api/transactions").configure(transaction_route));
}
