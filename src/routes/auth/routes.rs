use actix_web::web;

use super::handlers::{forgot_password, login, profile, register, reset_password_handler};
use super::middlewares::RequireAuth;

pub fn auth_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/register").route(web::post().to(register)));
    cfg.service(web::resource("/login").route(web::post().to(login)));
    cfg.service(web::resource("/forgot-password").route(web::post().to(forgot_password)));
    cfg.service(web::resource("/reset-password").route(web::post().to(reset_password_handler)));
    cfg.service(
        web::resource("/profile")
            .route(web::get().to(profile))
            .wrap(RequireAuth),
    );
}
