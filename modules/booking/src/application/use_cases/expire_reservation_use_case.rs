// ExpireReservationUseCase - the "Expire" operation of the Reservation Coordinator (4.4.3)

use std::sync::Arc;

use chrono::Utc;

use crate::application::dtos::ExpireReservationCommand;
use crate::domain::repositories::BookingGateway;
use crate::domain::value_objects::{ReservationId, ReservationStatus, SeatStatus};
use crate::BookingError;

/// Outcome of an Expire call, used by the Coordinator to decide which
/// post-commit events to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpireOutcome {
    /// The reservation lapsed and was released; emit `reservation.expired`
    /// and `seat.released`.
    Expired {
        seat_id: uuid::Uuid,
        seat_label: String,
        screening_id: uuid::Uuid,
        buyer_id: String,
    },
    /// Nothing to do: already purged, already terminal, or the deadline has
    /// not actually passed yet (scheduler jitter). Idempotent no-op.
    Noop,
}

/// Idempotently releases a pending hold whose deadline has passed.
pub struct ExpireReservationUseCase<G>
where
    G: BookingGateway,
{
    gateway: Arc<G>,
}

impl<G> ExpireReservationUseCase<G>
where
    G: BookingGateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn execute(&self, command: ExpireReservationCommand) -> Result<ExpireOutcome, BookingError> {
        let reservation_id = ReservationId::from_uuid(command.reservation_id);

        let mut session = self.gateway.begin().await?;

        let found = session.fetch_and_lock_reservation(reservation_id).await?;

        let Some((reservation, seat)) = found else {
            // Benign: reservation purged or never existed.
            session.commit().await?;
            return Ok(ExpireOutcome::Noop);
        };

        if reservation.status() != ReservationStatus::Pending {
            session.commit().await?;
            return Ok(ExpireOutcome::Noop);
        }

        if !reservation.is_past_deadline(Utc::now()) {
            // Timer fired early (scheduler jitter). Acknowledge as a no-op;
            // see the design note on the missing backstop sweeper.
            session.commit().await?;
            return Ok(ExpireOutcome::Noop);
        }

        session
            .update_reservation_status(reservation_id, ReservationStatus::Expired)
            .await?;
        session.update_seat_status(seat.id(), SeatStatus::Available).await?;

        session.commit().await?;

        Ok(ExpireOutcome::Expired {
            seat_id: seat.id().into_uuid(),
            seat_label: seat.label().to_string(),
            screening_id: seat.screening_id().into_uuid(),
            buyer_id: reservation.buyer_id().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dtos::{ConfirmPaymentCommand, CreateHoldCommand};
    use crate::application::use_cases::{ConfirmPaymentUseCase, CreateHoldUseCase};
    use crate::domain::entities::{Screening, Seat};
    use crate::domain::value_objects::{ScreeningId, SeatId};
    use crate::test_support::InMemoryBookingGateway;
    use crate::BookingConfig;
    use rust_decimal_macros::dec;

    async fn seeded_gateway() -> (Arc<InMemoryBookingGateway>, ScreeningId) {
        let gateway = Arc::new(InMemoryBookingGateway::new());
        let screening_id = ScreeningId::new();
        gateway
            .seed_screening(Screening::reconstitute(
                screening_id,
                "Arrival".to_string(),
                Utc::now(),
                1,
                dec!(10),
                true,
                Utc::now(),
                Utc::now(),
            ))
            .await;
        gateway
            .seed_seat(Seat::reconstitute(
                SeatId::new(),
                screening_id,
                "C1".to_string(),
                "C".to_string(),
                SeatStatus::Available,
                Utc::now(),
                Utc::now(),
            ))
            .await;
        (gateway, screening_id)
    }

    #[tokio::test]
    async fn test_expire_releases_past_deadline_hold() {
        let (gateway, screening_id) = seeded_gateway().await;
        let mut config = BookingConfig::default();
        config.reservation_ttl = std::time::Duration::from_millis(20);
        let create_use_case = CreateHoldUseCase::new(gateway.clone(), &config);

        // A short but non-zero TTL keeps the deadline in the future at
        // creation time; sleeping past it here is what puts it in the past.
        let holds = create_use_case
            .execute(CreateHoldCommand {
                screening_id: screening_id.into_uuid(),
                seat_labels: vec!["C1".to_string()],
                buyer_id: "u1".to_string(),
            })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;

        let expire_use_case = ExpireReservationUseCase::new(gateway.clone());
        let outcome = expire_use_case
            .execute(ExpireReservationCommand {
                reservation_id: holds[0].reservation_id,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, ExpireOutcome::Expired { .. }));
        assert_eq!(gateway.seat_status(SeatId::from_uuid(holds[0].seat_id)).await, SeatStatus::Available);
        assert_eq!(
            gateway.reservation_status(ReservationId::from_uuid(holds[0].reservation_id)).await,
            ReservationStatus::Expired
        );
    }

    #[tokio::test]
    async fn test_expire_unknown_reservation_is_noop() {
        let (gateway, _screening_id) = seeded_gateway().await;
        let use_case = ExpireReservationUseCase::new(gateway);

        let outcome = use_case
            .execute(ExpireReservationCommand {
                reservation_id: uuid::Uuid::new_v4(),
            })
            .await
            .unwrap();

        assert_eq!(outcome, ExpireOutcome::Noop);
    }

    #[tokio::test]
    async fn test_expire_is_idempotent() {
        let (gateway, screening_id) = seeded_gateway().await;
        let mut config = BookingConfig::default();
        config.reservation_ttl = std::time::Duration::from_millis(20);
        let create_use_case = CreateHoldUseCase::new(gateway.clone(), &config);
        let holds = create_use_case
            .execute(CreateHoldCommand {
                screening_id: screening_id.into_uuid(),
                seat_labels: vec!["C1".to_string()],
                buyer_id: "u1".to_string(),
            })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;

        let use_case = ExpireReservationUseCase::new(gateway.clone());
        let command = ExpireReservationCommand {
            reservation_id: holds[0].reservation_id,
        };

        let first = use_case.execute(command.clone()).await.unwrap();
        let second = use_case.execute(command).await.unwrap();

        assert!(matches!(first, ExpireOutcome::Expired { .. }));
        assert_eq!(second, ExpireOutcome::Noop);
    }

    #[tokio::test]
    async fn test_expire_on_confirmed_reservation_is_noop() {
        let (gateway, screening_id) = seeded_gateway().await;
        let create_use_case = CreateHoldUseCase::new(gateway.clone(), &BookingConfig::default());
        let holds = create_use_case
            .execute(CreateHoldCommand {
                screening_id: screening_id.into_uuid(),
                seat_labels: vec!["C1".to_string()],
                buyer_id: "u1".to_string(),
            })
            .await
            .unwrap();

        let confirm_use_case = ConfirmPaymentUseCase::new(gateway.clone());
        confirm_use_case
            .execute(ConfirmPaymentCommand {
                reservation_id: holds[0].reservation_id,
                buyer_id: "u1".to_string(),
            })
            .await
            .unwrap();

        let expire_use_case = ExpireReservationUseCase::new(gateway.clone());
        let outcome = expire_use_case
            .execute(ExpireReservationCommand {
                reservation_id: holds[0].reservation_id,
            })
            .await
            .unwrap();

        assert_eq!(outcome, ExpireOutcome::Noop);
        assert_eq!(gateway.seat_status(SeatId::from_uuid(holds[0].seat_id)).await, SeatStatus::Sold);
    }
}
