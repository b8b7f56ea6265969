pub mod auth;
pub mod payment;
mod route;
pub mod util;
pub use auth::auth_route;
pub use payment::{payment_route, transaction_route};
pub use route::main_route;
pub use util::util_route;
