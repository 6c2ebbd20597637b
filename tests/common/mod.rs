#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use webhook_relay::config::DeliverySettings;
use webhook_relay::domain::delivery::DeliveryOutcome;
use webhook_relay::domain::event::{Event, Signature, Transaction};
use webhook_relay::domain::ports::DeliveryPort;
use webhook_relay::error::Result;
use webhook_relay::interfaces::http::dto::WebhookRequest;

pub const EVENTS_SECRET: &str = "prod_events_OcHnIzeBl5socpwByQ4hA52Em3USQ93Z";

pub fn fixture(name: &str) -> Value {
    let raw = match name {
        "transaction_updated" => include_str!("../fixtures/transaction_updated.json"),
        "payout_updated" => include_str!("../fixtures/payout_updated.json"),
        other => panic!("unknown fixture {other}"),
    };
    serde_json::from_str(raw).unwrap()
}

pub fn fixture_event(name: &str) -> Event {
    let request: WebhookRequest = serde_json::from_value(fixture(name)).unwrap();
    Event::try_from(request).unwrap()
}

/// An approved card payment without payout data.
pub fn approved_event(id: &str) -> Event {
    Event {
        kind: "transaction.updated".to_string(),
        transaction: Transaction {
            id: id.to_string(),
            status: Some("APPROVED".to_string()),
            amount_in_cents: Some(2000),
            currency: Some("COP".to_string()),
            ..Default::default()
        },
        signature: Signature::default(),
        timestamp: Some(1_530_291_411),
        sent_at: None,
        environment: Some("test".to_string()),
    }
}

pub fn delivery_settings(primary_url: String, secondary_url: String) -> DeliverySettings {
    DeliverySettings {
        primary_url,
        secondary_url,
        connect_timeout: Duration::from_secs(1),
        read_timeout: Duration::from_secs(1),
    }
}

/// A port that breaks its contract by panicking on the primary attempt.
pub struct PanickingPort;

#[async_trait]
impl DeliveryPort for PanickingPort {
    async fn deliver_to_primary(&self, _event: &Event) -> Result<DeliveryOutcome> {
        panic!("primary adapter exploded")
    }

    async fn deliver_to_secondary(&self, _event: &Event) -> Result<DeliveryOutcome> {
        Ok(DeliveryOutcome::succeeded("ok"))
    }
}
