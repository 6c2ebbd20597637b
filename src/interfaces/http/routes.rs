use super::dto::{WebhookRequest, WebhookResponse};
use crate::application::relay::RelayPolicy;
use crate::domain::event::Event;
use crate::domain::ports::{SignatureVerifier, SignatureVerifierBox};
use crate::error::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const WEBHOOK_PATH: &str = "/api-gateway/wompi/update-transaction";

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    relay: Arc<RelayPolicy>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl AppState {
    pub fn new(relay: RelayPolicy, verifier: SignatureVerifierBox) -> Self {
        Self {
            relay: Arc::new(relay),
            verifier: Arc::from(verifier),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route(WEBHOOK_PATH, post(update_transaction))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> &'static str {
    "Payment gateway webhook relay"
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Receives a gateway notification and relays it.
///
/// Answers 200 once either destination accepted the event and 500 when both
/// failed, so the gateway retries the notification later.
async fn update_transaction(
    State(state): State<AppState>,
    Json(request): Json<WebhookRequest>,
) -> Result<(StatusCode, Json<WebhookResponse>)> {
    info!(event = request.event.as_deref().unwrap_or("-"), "Webhook received");

    let event = Event::try_from(request)?;
    state.verifier.verify(&event)?;

    let result = state.relay.relay(&event).await;

    let (status, label) = if result.succeeded {
        info!(transaction_id = %event.transaction.id, message = %result.message, "Webhook relayed");
        (StatusCode::OK, "success")
    } else {
        error!(transaction_id = %event.transaction.id, message = %result.message, "Webhook not relayed");
        (StatusCode::INTERNAL_SERVER_ERROR, "error")
    };

    Ok((
        status,
        Json(WebhookResponse {
            transaction_id: Some(event.transaction.id),
            event: Some(event.kind),
            status: label.to_string(),
            message: result.message,
        }),
    ))
}
