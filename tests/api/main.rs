mod auth;
mod health_check;
mod helpers;
mod payment;
