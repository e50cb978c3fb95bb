pub mod auth;
pub mod configuration;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod storage;
pub mod telemetry;
pub mod validators;
