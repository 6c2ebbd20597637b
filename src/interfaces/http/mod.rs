//! HTTP ingress: wire types, their mapping to the domain event, and the
//! axum router exposing the webhook endpoint.

pub mod dto;
pub mod error;
pub mod routes;

pub use routes::{AppState, WEBHOOK_PATH, router};
