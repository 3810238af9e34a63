//! Spin HTTP API
//!
//! `POST /spin/:game` plus status, health and Prometheus metrics endpoints.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod monitoring;
pub mod routes;
pub mod server;

pub use server::{build_state, create_app, init_tracing, ApiServer};
