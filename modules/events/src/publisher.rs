// EventPublisher port (C3) - fan-out destination for domain events

use async_trait::async_trait;

use crate::{DomainEvent, EventsError};

/// Publishes domain events after their triggering transaction has
/// committed. Delivery is best-effort at-least-once; consumers are assumed
/// idempotent.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventsError>;
}
