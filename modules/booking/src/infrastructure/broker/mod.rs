// RabbitMQ-backed Delay Scheduler (C2) and Expiration Consumer (C5)

mod expiration_consumer;
mod rabbitmq_delay_scheduler;

pub use expiration_consumer::ExpirationConsumer;
pub use rabbitmq_delay_scheduler::RabbitMqDelayScheduler;

use serde::{Deserialize, Serialize};

/// Wire payload carried by both the wait queue and the processing queue:
/// `ExpireReservation { reservationId }` from the spec's §6.1 command
/// surface.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ExpirationPayload {
    pub reservation_id: uuid::Uuid,
}
