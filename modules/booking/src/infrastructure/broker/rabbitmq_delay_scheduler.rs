//! RabbitMQ-backed Delay Scheduler (C2).
//!
//! Durably enqueues `{reservationId}` so that, after approximately `delay`
//! has elapsed, it becomes deliverable to the Expiration Consumer. Realised
//! with the canonical "wait queue + dead-letter exchange" pattern from the
//! spec's §6.3: a message published to the wait queue carries a per-message
//! TTL (`x-expiration`); once it expires unconsumed, RabbitMQ dead-letters
//! it onto the processing exchange, from which the Expiration Consumer's
//! queue receives it. The wait queue itself has no consumers -- it exists
//! only to hold messages until their TTL lapses.

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use std::time::Duration;

use crate::domain::value_objects::ReservationId;
use crate::infrastructure::broker::ExpirationPayload;
use crate::BookingError;

pub(crate) const WAIT_EXCHANGE: &str = "booking.delay.wait";
pub(crate) const WAIT_QUEUE: &str = "booking.delay.wait";
pub(crate) const PROCESSING_EXCHANGE: &str = "booking.delay.dlx";
pub(crate) const PROCESSING_QUEUE: &str = "booking.expirations";
const ROUTING_KEY: &str = "expire";

/// Publishes expiration payloads onto the wait queue. The scheduler itself
/// offers no guarantee on ordering or precision -- only that the message
/// eventually reaches the Expiration Consumer at least once.
pub struct RabbitMqDelayScheduler {
    channel: Channel,
}

impl RabbitMqDelayScheduler {
    pub async fn connect(amqp_url: &str) -> Result<Self, BookingError> {
        let connection = Connection::connect(amqp_url, ConnectionProperties::default())
            .await
            .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

        declare_topology(&channel).await?;

        Ok(Self { channel })
    }

    #[cfg(test)]
    pub(crate) fn from_channel(channel: Channel) -> Self {
        Self { channel }
    }
}

/// Declares the wait exchange/queue and the processing exchange/queue that
/// the Expiration Consumer drains. Idempotent: `declare` with matching
/// arguments against an already-declared entity is a no-op.
pub(crate) async fn declare_topology(channel: &Channel) -> Result<(), BookingError> {
    channel
        .exchange_declare(
            PROCESSING_EXCHANGE,
            ExchangeKind::Direct,
            ExchangeDeclareOptions { durable: true, ..Default::default() },
            FieldTable::default(),
        )
        .await
        .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

    channel
        .queue_declare(
            PROCESSING_QUEUE,
            QueueDeclareOptions { durable: true, ..Default::default() },
            FieldTable::default(),
        )
        .await
        .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

    channel
        .queue_bind(
            PROCESSING_QUEUE,
            PROCESSING_EXCHANGE,
            ROUTING_KEY,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

    channel
        .exchange_declare(
            WAIT_EXCHANGE,
            ExchangeKind::Direct,
            ExchangeDeclareOptions { durable: true, ..Default::default() },
            FieldTable::default(),
        )
        .await
        .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

    let mut wait_args = FieldTable::default();
    wait_args.insert("x-dead-letter-exchange".into(), AMQPValue::LongString(PROCESSING_EXCHANGE.into()));
    wait_args.insert("x-dead-letter-routing-key".into(), AMQPValue::LongString(ROUTING_KEY.into()));

    channel
        .queue_declare(
            WAIT_QUEUE,
            QueueDeclareOptions { durable: true, ..Default::default() },
            wait_args,
        )
        .await
        .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

    channel
        .queue_bind(
            WAIT_QUEUE,
            WAIT_EXCHANGE,
            ROUTING_KEY,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

    Ok(())
}

#[async_trait]
impl crate::domain::repositories::DelayScheduler for RabbitMqDelayScheduler {
    async fn schedule_expiration(&self, reservation_id: ReservationId, delay: Duration) -> Result<(), BookingError> {
        let payload = ExpirationPayload { reservation_id: reservation_id.into_uuid() };
        let body = serde_json::to_vec(&payload).map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

        let confirm = self
            .channel
            .basic_publish(
                WAIT_EXCHANGE,
                ROUTING_KEY,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2)
                    .with_expiration(delay.as_millis().to_string().into()),
            )
            .await
            .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

        confirm.await.map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

        tracing::debug!(reservation_id = %reservation_id.into_uuid(), delay_ms = delay.as_millis(), "scheduled expiration");
        Ok(())
    }
}
