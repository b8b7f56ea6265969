//! src/lib.rs
pub mod commands;
pub mod configuration;
pub mod constants;
pub mod database;
pub mod domain;
pub mod email_client;
pub mod email_templates;
pub mod errors;
pub mod openapi;
pub mod payment_client;
pub mod repository;
pub mod routes;
pub mod schemas;
pub mod startup;
pub mod telemetry;
pub mod utils;
