use crate::config::DeliverySettings;
use crate::domain::delivery::{DeliveryErrorKind, DeliveryOutcome, Destination};
use crate::domain::event::{Event, GatewayTime, Signature, Transaction};
use crate::domain::ports::DeliveryPort;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Body POSTed to a destination: the full event, in the gateway's nested shape.
#[derive(Debug, Serialize)]
pub struct DeliveryPayload<'a> {
    pub event: &'a str,
    pub data: PayloadData<'a>,
    pub signature: &'a Signature,
    pub timestamp: Option<i64>,
    pub sent_at: Option<&'a GatewayTime>,
    pub environment: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct PayloadData<'a> {
    pub transaction: &'a Transaction,
}

impl<'a> From<&'a Event> for DeliveryPayload<'a> {
    fn from(event: &'a Event) -> Self {
        Self {
            event: &event.kind,
            data: PayloadData {
                transaction: &event.transaction,
            },
            signature: &event.signature,
            timestamp: event.timestamp,
            sent_at: event.sent_at.as_ref(),
            environment: event.environment.as_deref(),
        }
    }
}

/// Longest slice of a destination's error body carried into an outcome message.
pub const MAX_ERROR_BODY_CHARS: usize = 256;

/// Response body destinations answer with.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DestinationResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub error_code: Option<String>,
}

/// Delivers events over HTTP with a shared, pooled `reqwest::Client`.
///
/// The HTTP status decides the outcome: any 2xx is a delivery, 4xx and 5xx
/// map to client and server errors, and transport failures (refused
/// connection, timeout) to connection errors.
#[derive(Clone)]
pub struct HttpDeliveryAdapter {
    client: Client,
    primary_url: String,
    secondary_url: String,
}

impl HttpDeliveryAdapter {
    /// Builds the adapter and its client from the delivery settings.
    ///
    /// The client's total timeout is connect + read, so an attempt can never
    /// outlive both budgets.
    pub fn new(settings: &DeliverySettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.connect_timeout + settings.read_timeout)
            // A followed 301/302/303 turns the POST into a body-less GET
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            primary_url: settings.primary_url.clone(),
            secondary_url: settings.secondary_url.clone(),
        })
    }

    fn url(&self, destination: Destination) -> &str {
        match destination {
            Destination::Primary => &self.primary_url,
            Destination::Secondary => &self.secondary_url,
        }
    }

    async fn post(&self, destination: Destination, event: &Event) -> DeliveryOutcome {
        let url = self.url(destination);
        let transaction_id = event.transaction.id.as_str();
        info!(transaction_id, %destination, url, event = %event.kind, "Posting event");

        let response = match self
            .client
            .post(url)
            .json(&DeliveryPayload::from(event))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return log_failure(destination, transaction_id, transport_failure(&e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return log_failure(destination, transaction_id, transport_failure(&e));
            }
            Err(_) => String::new(),
        };

        let outcome = classify_response(destination, status, &body);
        if outcome.succeeded {
            info!(transaction_id, %destination, status = status.as_u16(), "Destination accepted event");
            outcome
        } else {
            log_failure(destination, transaction_id, outcome)
        }
    }
}

#[async_trait]
impl DeliveryPort for HttpDeliveryAdapter {
    async fn deliver_to_primary(&self, event: &Event) -> Result<DeliveryOutcome> {
        Ok(self.post(Destination::Primary, event).await)
    }

    async fn deliver_to_secondary(&self, event: &Event) -> Result<DeliveryOutcome> {
        Ok(self.post(Destination::Secondary, event).await)
    }
}

/// Maps an HTTP status and body to an outcome.
pub fn classify_response(destination: Destination, status: StatusCode, body: &str) -> DeliveryOutcome {
    let code = status.as_u16();

    if status.is_success() {
        if body.trim().is_empty() {
            return DeliveryOutcome::succeeded(format!("delivered to {destination}"));
        }
        return match serde_json::from_str::<DestinationResponse>(body) {
            Ok(response) => {
                if response.success == Some(false) {
                    warn!(
                        %destination,
                        status = code,
                        error_code = response.error_code.as_deref().unwrap_or("-"),
                        "Destination answered 2xx but reported success=false"
                    );
                }
                DeliveryOutcome::succeeded(
                    response
                        .message
                        .unwrap_or_else(|| format!("delivered to {destination}")),
                )
            }
            Err(e) => DeliveryOutcome::failed(
                DeliveryErrorKind::Unexpected,
                format!("unexpected error: invalid response body: {e}"),
            ),
        };
    }

    if status.is_client_error() {
        DeliveryOutcome::failed(
            DeliveryErrorKind::Client(code),
            format!("client error: {status} - {}", excerpt(body)),
        )
    } else if status.is_server_error() {
        DeliveryOutcome::failed(
            DeliveryErrorKind::Server(code),
            format!("server error: {status} - {}", excerpt(body)),
        )
    } else {
        DeliveryOutcome::failed(
            DeliveryErrorKind::Unexpected,
            format!("unexpected error: unexpected status {status}"),
        )
    }
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

fn transport_failure(e: &reqwest::Error) -> DeliveryOutcome {
    if e.is_connect() || e.is_timeout() {
        DeliveryOutcome::failed(DeliveryErrorKind::Connection, format!("connection error: {e}"))
    } else {
        DeliveryOutcome::failed(DeliveryErrorKind::Unexpected, format!("unexpected error: {e}"))
    }
}

fn log_failure(
    destination: Destination,
    transaction_id: &str,
    outcome: DeliveryOutcome,
) -> DeliveryOutcome {
    let error_code = outcome.error_code();
    error!(
        transaction_id,
        %destination,
        error_code = error_code.as_deref().unwrap_or("-"),
        message = %outcome.message,
        "Delivery failed"
    );
    outcome
}
