//! Expiration Consumer (C5).
//!
//! Drains the processing queue a message lands on once its wait-queue TTL
//! lapses, and invokes [`ReservationCoordinator::expire_reservation`] for
//! each. Accumulates up to `batch_size` messages or `flush_interval`,
//! whichever comes first, and processes a batch concurrently.
//! Acknowledgement is per message, keyed to that message's own outcome: a
//! batch of mixed success/failure acks only the successes and nacks the
//! rest with `requeue = true` so the broker redelivers them.

use std::sync::Arc;
use std::time::Duration;

use events::EventPublisher;
use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, Consumer};
use tokio::time::Instant;

use crate::application::dtos::ExpireReservationCommand;
use crate::application::use_cases::ReservationCoordinator;
use crate::domain::repositories::{BookingGateway, DelayScheduler};
use crate::infrastructure::broker::rabbitmq_delay_scheduler::{declare_topology, PROCESSING_QUEUE};
use crate::infrastructure::broker::ExpirationPayload;
use crate::BookingError;

const CONSUMER_TAG: &str = "booking-expiration-consumer";

/// A single replica's share of the expiration queue. `prefetchCount = 1`
/// (set via `basic_qos`) so multiple replicas drain the queue cooperatively
/// rather than one replica hoarding unacked work.
pub struct ExpirationConsumer<G, S, P>
where
    G: BookingGateway,
    S: DelayScheduler,
    P: EventPublisher,
{
    channel: Channel,
    coordinator: Arc<ReservationCoordinator<G, S, P>>,
    batch_size: usize,
    flush_interval: Duration,
}

impl<G, S, P> ExpirationConsumer<G, S, P>
where
    G: BookingGateway + 'static,
    S: DelayScheduler + 'static,
    P: EventPublisher + 'static,
{
    pub async fn connect(
        amqp_url: &str,
        coordinator: Arc<ReservationCoordinator<G, S, P>>,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Result<Self, BookingError> {
        let connection = Connection::connect(amqp_url, ConnectionProperties::default())
            .await
            .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

        declare_topology(&channel).await?;

        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

        Ok(Self { channel, coordinator, batch_size, flush_interval })
    }

    /// Runs the drain loop forever. Intended to be spawned as a background
    /// task; returns only if the broker connection is lost and the consumer
    /// stream closes.
    pub async fn run(self) -> Result<(), BookingError> {
        let mut consumer = self
            .channel
            .basic_consume(
                PROCESSING_QUEUE,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| BookingError::BrokerUnavailable(e.to_string()))?;

        loop {
            let batch = self.collect_batch(&mut consumer).await;
            if batch.is_empty() {
                continue;
            }
            self.process_batch(batch).await;
        }
    }

    async fn collect_batch(&self, consumer: &mut Consumer) -> Vec<Delivery> {
        let mut batch = Vec::with_capacity(self.batch_size);
        let deadline = Instant::now() + self.flush_interval;

        while batch.len() < self.batch_size {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, consumer.next()).await {
                Ok(Some(Ok(delivery))) => batch.push(delivery),
                Ok(Some(Err(err))) => {
                    tracing::error!(error = %err, "error reading from expiration queue");
                    break;
                }
                Ok(None) => break,
                Err(_elapsed) => break,
            }
        }

        batch
    }

    async fn process_batch(&self, batch: Vec<Delivery>) {
        let futures = batch.into_iter().map(|delivery| self.process_one(delivery));
        futures::future::join_all(futures).await;
    }

    async fn process_one(&self, delivery: Delivery) {
        let payload: ExpirationPayload = match serde_json::from_slice(&delivery.data) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(error = %err, "malformed expiration payload, dropping message");
                if let Err(ack_err) = delivery.ack(BasicAckOptions::default()).await {
                    tracing::error!(error = %ack_err, "failed to ack malformed expiration message");
                }
                return;
            }
        };

        let command = ExpireReservationCommand { reservation_id: payload.reservation_id };

        match self.coordinator.expire_reservation(command).await {
            Ok(()) => {
                if let Err(err) = delivery.ack(BasicAckOptions::default()).await {
                    tracing::error!(error = %err, reservation_id = %payload.reservation_id, "failed to ack expiration message");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, reservation_id = %payload.reservation_id, "expire failed, requeueing");
                let nack_options = BasicNackOptions { requeue: true, ..Default::default() };
                if let Err(err) = delivery.nack(nack_options).await {
                    tracing::error!(error = %err, reservation_id = %payload.reservation_id, "failed to nack expiration message");
                }
            }
        }
    }
}
