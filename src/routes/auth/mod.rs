pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod middlewares;
pub mod models;
mod routes;
pub mod schemas;
pub mod utils;
pub use routes::auth_route;
