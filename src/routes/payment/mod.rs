pub(crate) mod errors;
pub mod handlers;
pub mod models;
mod routes;
pub mod schemas;
#[cfg(test)]
mod tests;
pub mod utils;
pub use routes::{payment_route, transaction_route};
