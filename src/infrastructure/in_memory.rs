use crate::domain::delivery::{DeliveryErrorKind, DeliveryOutcome, Destination};
use crate::domain::event::Event;
use crate::domain::ports::DeliveryPort;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe delivery port that keeps events in memory instead of sending them.
///
/// Every destination accepts by default. Use `rejecting` to make a destination
/// fail with a given error kind. Clones share the same delivery log, so a
/// handle kept by the caller observes what the relay policy delivered.
#[derive(Default, Clone)]
pub struct InMemoryDeliveryPort {
    deliveries: Arc<RwLock<Vec<(Destination, Event)>>>,
    rejections: HashMap<Destination, (DeliveryErrorKind, String)>,
}

impl InMemoryDeliveryPort {
    /// Creates a port where both destinations accept every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `destination` fail every attempt with `kind` and `message`.
    pub fn rejecting(
        mut self,
        destination: Destination,
        kind: DeliveryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        self.rejections.insert(destination, (kind, message.into()));
        self
    }

    /// Destinations attempted so far, in call order.
    pub async fn attempts(&self) -> Vec<Destination> {
        let deliveries = self.deliveries.read().await;
        deliveries.iter().map(|(destination, _)| *destination).collect()
    }

    /// Events handed to `destination`, including rejected attempts.
    pub async fn deliveries_to(&self, destination: Destination) -> Vec<Event> {
        let deliveries = self.deliveries.read().await;
        deliveries
            .iter()
            .filter(|(d, _)| *d == destination)
            .map(|(_, event)| event.clone())
            .collect()
    }

    async fn record(&self, destination: Destination, event: &Event) -> DeliveryOutcome {
        let mut deliveries = self.deliveries.write().await;
        deliveries.push((destination, event.clone()));

        match self.rejections.get(&destination) {
            Some((kind, message)) => DeliveryOutcome::failed(*kind, message.clone()),
            None => DeliveryOutcome::succeeded(format!("recorded in memory ({destination})")),
        }
    }
}

#[async_trait]
impl DeliveryPort for InMemoryDeliveryPort {
    async fn deliver_to_primary(&self, event: &Event) -> Result<DeliveryOutcome> {
        Ok(self.record(Destination::Primary, event).await)
    }

    async fn deliver_to_secondary(&self, event: &Event) -> Result<DeliveryOutcome> {
        Ok(self.record(Destination::Secondary, event).await)
    }
}
