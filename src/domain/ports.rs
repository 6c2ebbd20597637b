use super::delivery::{Destination, DeliveryOutcome};
use super::event::Event;
use crate::error::Result;
use async_trait::async_trait;

/// Outbound side of the relay: hands an event to one downstream service.
///
/// Transport and remote failures come back as a failed `DeliveryOutcome`.
/// `Err` is reserved for broken adapters and is absorbed by the relay policy.
#[async_trait]
pub trait DeliveryPort: Send + Sync {
    async fn deliver_to_primary(&self, event: &Event) -> Result<DeliveryOutcome>;
    async fn deliver_to_secondary(&self, event: &Event) -> Result<DeliveryOutcome>;

    async fn deliver(&self, destination: Destination, event: &Event) -> Result<DeliveryOutcome> {
        match destination {
            Destination::Primary => self.deliver_to_primary(event).await,
            Destination::Secondary => self.deliver_to_secondary(event).await,
        }
    }
}

/// Authenticity check applied by the ingress before an event is relayed.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, event: &Event) -> Result<()>;
}

pub type DeliveryPortBox = Box<dyn DeliveryPort>;
pub type SignatureVerifierBox = Box<dyn SignatureVerifier>;
