use crate::domain::delivery::{DeliveryErrorKind, DeliveryOutcome, Destination};
use crate::domain::event::Event;
use crate::domain::ports::DeliveryPortBox;
use crate::error::Result;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{error, info, warn};

/// How a relay invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayRoute {
    Primary,
    Fallback,
    Failed,
    /// The delivery port broke its contract (returned an error or panicked).
    Unexpected,
}

/// Final verdict handed back to the ingress for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResult {
    pub succeeded: bool,
    pub message: String,
    pub route: RelayRoute,
}

impl RelayResult {
    fn delivered(route: RelayRoute, message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            route,
        }
    }

    fn failed(route: RelayRoute, message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
            route,
        }
    }
}

/// Relays events to the primary destination and falls back to the secondary.
///
/// At most two attempts are made per event, strictly one after the other:
/// the secondary is contacted only once the primary attempt has failed. The
/// policy holds no per-event state, so one instance can serve any number of
/// concurrent requests.
pub struct RelayPolicy {
    port: DeliveryPortBox,
    attempt_timeout: Option<Duration>,
}

impl RelayPolicy {
    /// Creates a policy delivering through `port`.
    pub fn new(port: DeliveryPortBox) -> Self {
        Self {
            port,
            attempt_timeout: None,
        }
    }

    /// Bounds every attempt, whatever the adapter does. An attempt that runs
    /// past `limit` counts as a connection failure.
    pub fn with_attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = Some(limit);
        self
    }

    /// Relays `event`, never failing: every fault is folded into the result.
    pub async fn relay(&self, event: &Event) -> RelayResult {
        let transaction_id = event.transaction.id.as_str();
        info!(
            transaction_id,
            event = %event.kind,
            status = event.transaction.status.as_deref().unwrap_or("-"),
            "Relaying webhook event"
        );

        match AssertUnwindSafe(self.try_relay(event)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!(transaction_id, error = %e, "Delivery port failed unexpectedly");
                RelayResult::failed(RelayRoute::Unexpected, format!("unexpected failure: {e}"))
            }
            Err(panic) => {
                let description = panic_description(panic.as_ref());
                error!(transaction_id, error = %description, "Delivery port panicked");
                RelayResult::failed(
                    RelayRoute::Unexpected,
                    format!("unexpected failure: {description}"),
                )
            }
        }
    }

    async fn try_relay(&self, event: &Event) -> Result<RelayResult> {
        let transaction_id = event.transaction.id.as_str();

        let primary = self.attempt(Destination::Primary, event).await?;
        if primary.succeeded {
            info!(transaction_id, destination = %Destination::Primary, "Event delivered");
            return Ok(RelayResult::delivered(
                RelayRoute::Primary,
                "delivered via primary",
            ));
        }

        let primary_code = primary.error_code();
        warn!(
            transaction_id,
            destination = %Destination::Primary,
            error_code = primary_code.as_deref().unwrap_or("-"),
            message = %primary.message,
            "Primary delivery failed, falling back to secondary"
        );

        let secondary = self.attempt(Destination::Secondary, event).await?;
        if secondary.succeeded {
            info!(transaction_id, destination = %Destination::Secondary, "Event delivered (fallback)");
            return Ok(RelayResult::delivered(
                RelayRoute::Fallback,
                "delivered via secondary (fallback)",
            ));
        }

        let secondary_code = secondary.error_code();
        error!(
            transaction_id,
            primary_error = primary_code.as_deref().unwrap_or("-"),
            secondary_error = secondary_code.as_deref().unwrap_or("-"),
            "Both destinations failed"
        );

        Ok(RelayResult::failed(
            RelayRoute::Failed,
            format!(
                "both destinations failed. {}: {} | {}: {}",
                Destination::Primary,
                primary.message,
                Destination::Secondary,
                secondary.message
            ),
        ))
    }

    async fn attempt(&self, destination: Destination, event: &Event) -> Result<DeliveryOutcome> {
        let delivery = self.port.deliver(destination, event);

        let Some(limit) = self.attempt_timeout else {
            return delivery.await;
        };

        match tokio::time::timeout(limit, delivery).await {
            Ok(outcome) => outcome,
            Err(_) => Ok(DeliveryOutcome::failed(
                DeliveryErrorKind::Connection,
                format!(
                    "{destination} delivery timed out after {}ms",
                    limit.as_millis()
                ),
            )),
        }
    }
}

fn panic_description(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "delivery port panicked".to_string()
    }
}
