// RabbitMqEventPublisher - lapin-backed EventPublisher implementation

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use lapin::types::FieldTable;

use crate::{DomainEvent, EventPublisher, EventsError};

const EXCHANGE: &str = "booking.events";

/// Publishes domain events to a durable topic exchange, routed by event
/// name (`reservation.created`, `payment.confirmed`, ...). Consumers bind
/// their own queues to the routing keys they care about.
pub struct RabbitMqEventPublisher {
    channel: Channel,
}

impl RabbitMqEventPublisher {
    pub async fn connect(amqp_url: &str) -> Result<Self, EventsError> {
        let connection = Connection::connect(amqp_url, ConnectionProperties::default())
            .await
            .map_err(|e| EventsError::BrokerUnavailable(e.to_string()))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| EventsError::BrokerUnavailable(e.to_string()))?;

        channel
            .exchange_declare(
                EXCHANGE,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| EventsError::BrokerUnavailable(e.to_string()))?;

        Ok(Self { channel })
    }
}

#[async_trait]
impl EventPublisher for RabbitMqEventPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventsError> {
        let routing_key = event.name();
        let payload = serde_json::to_vec(&event)?;

        let confirm = self
            .channel
            .basic_publish(
                EXCHANGE,
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|e| EventsError::PublishFailed(e.to_string()))?;

        confirm
            .await
            .map_err(|e| EventsError::PublishFailed(e.to_string()))?;

        tracing::debug!(event = routing_key, "published domain event");
        Ok(())
    }
}
