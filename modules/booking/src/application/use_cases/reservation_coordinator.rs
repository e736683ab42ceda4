//! Reservation Coordinator (C4) -- the sole entry point the process wiring
//! calls into. Wraps each of the three operations with the retry/backoff
//! policy and fans out post-commit side effects (scheduling an expiration,
//! publishing domain events) strictly after the transaction that produced
//! them has committed, never inside it.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use events::{DomainEvent, EventPublisher};
use tracing::instrument;

use crate::application::dtos::{ConfirmPaymentCommand, CreateHoldCommand, ExpireReservationCommand, ReservationView, SaleView};
use crate::application::use_cases::confirm_payment_use_case::ConfirmPaymentUseCase;
use crate::application::use_cases::create_hold_use_case::CreateHoldUseCase;
use crate::application::use_cases::expire_reservation_use_case::{ExpireOutcome, ExpireReservationUseCase};
use crate::domain::repositories::{BookingGateway, DelayScheduler};
use crate::infrastructure::retry::{with_retry, RetryPolicy};
use crate::BookingConfig;
use crate::BookingError;

pub struct ReservationCoordinator<G, S, P>
where
    G: BookingGateway,
    S: DelayScheduler,
    P: EventPublisher,
{
    create_hold: CreateHoldUseCase<G>,
    confirm_payment: ConfirmPaymentUseCase<G>,
    expire_reservation: ExpireReservationUseCase<G>,
    scheduler: Arc<S>,
    publisher: Arc<P>,
    retry_policy: RetryPolicy,
    reservation_ttl: StdDuration,
}

impl<G, S, P> ReservationCoordinator<G, S, P>
where
    G: BookingGateway,
    S: DelayScheduler,
    P: EventPublisher,
{
    pub fn new(gateway: Arc<G>, scheduler: Arc<S>, publisher: Arc<P>, config: &BookingConfig) -> Self {
        Self {
            create_hold: CreateHoldUseCase::new(gateway.clone(), config),
            confirm_payment: ConfirmPaymentUseCase::new(gateway.clone()),
            expire_reservation: ExpireReservationUseCase::new(gateway),
            scheduler,
            publisher,
            retry_policy: RetryPolicy::from(config),
            reservation_ttl: config.reservation_ttl,
        }
    }

    /// Places one or more holds, then schedules each for automatic expiration
    /// and publishes a `reservation.created` event per seat.
    #[instrument(skip(self, command), fields(screening_id = %command.screening_id, buyer_id = %command.buyer_id))]
    pub async fn create_hold(&self, command: CreateHoldCommand) -> Result<Vec<ReservationView>, BookingError> {
        let views = with_retry(self.retry_policy, || self.create_hold.execute(command.clone())).await?;

        for view in &views {
            let reservation_id = crate::domain::value_objects::ReservationId::from_uuid(view.reservation_id);
            if let Err(err) = self.scheduler.schedule_expiration(reservation_id, self.reservation_ttl).await {
                tracing::error!(reservation_id = %view.reservation_id, error = %err, "failed to schedule expiration");
            }

            let event = DomainEvent::ReservationCreated {
                reservation_id: view.reservation_id,
                seat_id: view.seat_id,
                seat_label: view.seat_label.clone(),
                user_id: view.buyer_id.clone(),
                expires_at: view.expires_at,
            };
            if let Err(err) = self.publisher.publish(event).await {
                tracing::error!(reservation_id = %view.reservation_id, error = %err, "failed to publish reservation.created");
            }
        }

        Ok(views)
    }

    /// Confirms payment for a hold and its whole booking group, then
    /// publishes one `payment.confirmed` event per sale the group atomically
    /// created. On the idempotency short-circuit (the group was already
    /// confirmed by an earlier call) no sales are newly created, so no
    /// events are republished.
    #[instrument(skip(self, command), fields(reservation_id = %command.reservation_id, buyer_id = %command.buyer_id))]
    pub async fn confirm_payment(&self, command: ConfirmPaymentCommand) -> Result<SaleView, BookingError> {
        let outcome = with_retry(self.retry_policy, || self.confirm_payment.execute(command.clone())).await?;

        for sale in &outcome.newly_created {
            let event = DomainEvent::PaymentConfirmed {
                sale_id: sale.sale_id,
                reservation_id: sale.reservation_id,
                seat_id: sale.seat_id,
                seat_label: sale.seat_label.clone(),
                user_id: command.buyer_id.clone(),
                amount: sale.amount,
            };
            if let Err(err) = self.publisher.publish(event).await {
                tracing::error!(reservation_id = %sale.reservation_id, error = %err, "failed to publish payment.confirmed");
            }
        }

        Ok(outcome.target)
    }

    /// Idempotently expires a reservation whose deadline has passed. Invoked
    /// by the Expiration Consumer, not by end-user request.
    #[instrument(skip(self, command), fields(reservation_id = %command.reservation_id))]
    pub async fn expire_reservation(&self, command: ExpireReservationCommand) -> Result<(), BookingError> {
        let outcome = with_retry(self.retry_policy, || self.expire_reservation.execute(command.clone())).await?;

        if let ExpireOutcome::Expired { seat_id, seat_label, screening_id, buyer_id } = outcome {
            let expired_event = DomainEvent::ReservationExpired {
                reservation_id: command.reservation_id,
                seat_id,
                seat_label: seat_label.clone(),
                user_id: buyer_id,
            };
            if let Err(err) = self.publisher.publish(expired_event).await {
                tracing::error!(reservation_id = %command.reservation_id, error = %err, "failed to publish reservation.expired");
            }

            let released_event = DomainEvent::SeatReleased { seat_id, seat_label, screening_id };
            if let Err(err) = self.publisher.publish(released_event).await {
                tracing::error!(reservation_id = %command.reservation_id, error = %err, "failed to publish seat.released");
            }
        }

        Ok(())
    }
}
