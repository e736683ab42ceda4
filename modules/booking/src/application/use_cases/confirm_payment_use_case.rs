// ConfirmPaymentUseCase - the "Confirm Payment" operation of the Reservation Coordinator (4.4.2)

use std::sync::Arc;

use chrono::Utc;

use crate::application::dtos::{ConfirmPaymentCommand, SaleView};
use crate::domain::entities::Sale;
use crate::domain::repositories::BookingGateway;
use crate::domain::value_objects::{ReservationId, ReservationStatus, SeatId, SeatStatus};
use crate::BookingError;

/// Result of a Confirm Payment call: the sale matching the reservation the
/// caller asked about, plus every sale this particular call actually
/// created. `newly_created` is empty on the idempotency short-circuit (the
/// group was already confirmed by an earlier call) so the Coordinator knows
/// not to republish events for sales it already announced once.
pub struct ConfirmPaymentOutcome {
    pub target: SaleView,
    pub newly_created: Vec<SaleView>,
}

/// Converts a pending hold -- and every sibling in its booking group -- into
/// confirmed sales. Idempotent: confirming an already-confirmed reservation
/// returns the sale that was created the first time.
pub struct ConfirmPaymentUseCase<G>
where
    G: BookingGateway,
{
    gateway: Arc<G>,
}

impl<G> ConfirmPaymentUseCase<G>
where
    G: BookingGateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn execute(&self, command: ConfirmPaymentCommand) -> Result<ConfirmPaymentOutcome, BookingError> {
        let reservation_id = ReservationId::from_uuid(command.reservation_id);

        let mut session = self.gateway.begin().await?;

        let found = session
            .fetch_and_lock_reservation_for_buyer(reservation_id, &command.buyer_id)
            .await?;

        let Some((reservation, seat, screening)) = found else {
            session.rollback().await?;
            return Err(BookingError::ReservationNotFound(command.reservation_id));
        };

        // Idempotency short-circuit: already confirmed, return the existing sale.
        if reservation.status() == ReservationStatus::Confirmed {
            let sale = session.find_sale_by_reservation(reservation_id).await?;
            session.commit().await?;
            return match sale {
                Some(sale) => Ok(ConfirmPaymentOutcome {
                    target: sale_view(&sale, seat.label(), screening.movie_name(), screening.room_number()),
                    newly_created: Vec::new(),
                }),
                None => Err(BookingError::InvalidState(format!(
                    "reservation {reservation_id:?} is confirmed but has no sale"
                ))),
            };
        }

        if reservation.status() != ReservationStatus::Pending {
            session.rollback().await?;
            return Err(BookingError::ReservationNotPending(reservation.status().to_string()));
        }

        let now = Utc::now();
        if reservation.is_past_deadline(now) {
            session.rollback().await?;
            return Err(BookingError::ReservationExpired);
        }

        let siblings = session
            .fetch_and_lock_pending_siblings(&command.buyer_id, screening.id(), reservation.expires_at())
            .await?;

        let paid_at = now;
        let mut target_sale: Option<Sale> = None;
        let mut group_seat_labels: std::collections::HashMap<SeatId, String> = std::collections::HashMap::new();
        let mut created_sales: Vec<Sale> = Vec::with_capacity(siblings.len());

        for (mut sibling_reservation, sibling_seat) in siblings {
            sibling_reservation.confirm()?;
            session
                .update_reservation_status(sibling_reservation.id(), ReservationStatus::Confirmed)
                .await?;
            session.update_seat_status(sibling_seat.id(), SeatStatus::Sold).await?;

            let sale = Sale::create(
                sibling_seat.id(),
                sibling_reservation.buyer_id(),
                sibling_reservation.id(),
                screening.ticket_price(),
                paid_at,
            );
            session.insert_sale(&sale).await?;
            group_seat_labels.insert(sibling_seat.id(), sibling_seat.label().to_string());

            if sibling_reservation.id() == reservation_id {
                target_sale = Some(sale.clone());
            }
            created_sales.push(sale);
        }

        session.commit().await?;

        let target = target_sale.ok_or_else(|| {
            BookingError::InvalidState(format!("group confirm did not produce a sale for {reservation_id:?}"))
        })?;

        let newly_created = created_sales
            .iter()
            .map(|sale| {
                let label = group_seat_labels.get(&sale.seat_id()).map(String::as_str).unwrap_or_else(|| seat.label());
                sale_view(sale, label, screening.movie_name(), screening.room_number())
            })
            .collect();

        Ok(ConfirmPaymentOutcome {
            target: sale_view(&target, seat.label(), screening.movie_name(), screening.room_number()),
            newly_created,
        })
    }
}

fn sale_view(sale: &Sale, seat_label: &str, movie_name: &str, room_number: i32) -> SaleView {
    SaleView {
        sale_id: sale.id().into_uuid(),
        reservation_id: sale.reservation_id().into_uuid(),
        seat_id: sale.seat_id().into_uuid(),
        seat_label: seat_label.to_string(),
        movie_name: movie_name.to_string(),
        room_number,
        amount: sale.amount(),
        paid_at: sale.paid_at(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dtos::CreateHoldCommand;
    use crate::application::use_cases::CreateHoldUseCase;
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
                dec!(12.50),
                true,
                Utc::now(),
                Utc::now(),
            ))
            .await;

        for label in ["E1", "E2", "E3"] {
            gateway
                .seed_seat(Seat::reconstitute(
                    SeatId::new(),
                    screening_id,
                    label.to_string(),
                    "E".to_string(),
                    SeatStatus::Available,
                    Utc::now(),
                    Utc::now(),
                ))
                .await;
        }

        (gateway, screening_id)
    }

    #[tokio::test]
    async fn test_confirm_payment_success() {
        let (gateway, screening_id) = seeded_gateway().await;
        let create_use_case = CreateHoldUseCase::new(gateway.clone(), &BookingConfig::default());
        let holds = create_use_case
            .execute(CreateHoldCommand {
                screening_id: screening_id.into_uuid(),
                seat_labels: vec!["E1".to_string()],
                buyer_id: "u1".to_string(),
            })
            .await
            .unwrap();

        let confirm_use_case = ConfirmPaymentUseCase::new(gateway.clone());
        let outcome = confirm_use_case
            .execute(ConfirmPaymentCommand {
                reservation_id: holds[0].reservation_id,
                buyer_id: "u1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.target.amount, dec!(12.50));
        assert_eq!(outcome.target.seat_label, "E1");
        assert_eq!(outcome.newly_created.len(), 1);
        assert_eq!(gateway.seat_status(SeatId::from_uuid(holds[0].seat_id)).await, SeatStatus::Sold);
    }

    #[tokio::test]
    async fn test_confirm_payment_idempotent() {
        let (gateway, screening_id) = seeded_gateway().await;
        let create_use_case = CreateHoldUseCase::new(gateway.clone(), &BookingConfig::default());
        let holds = create_use_case
            .execute(CreateHoldCommand {
                screening_id: screening_id.into_uuid(),
                seat_labels: vec!["E1".to_string()],
                buyer_id: "u1".to_string(),
            })
            .await
            .unwrap();

        let confirm_use_case = ConfirmPaymentUseCase::new(gateway.clone());
        let command = ConfirmPaymentCommand {
            reservation_id: holds[0].reservation_id,
            buyer_id: "u1".to_string(),
        };

        let first = confirm_use_case.execute(command.clone()).await.unwrap();
        let second = confirm_use_case.execute(command).await.unwrap();

        assert_eq!(first.target.sale_id, second.target.sale_id);
        assert_eq!(first.newly_created.len(), 1, "first confirm created the sale");
        assert!(second.newly_created.is_empty(), "second confirm is an idempotent no-op, not a fresh sale");
        assert_eq!(gateway.sale_count().await, 1);
    }

    #[tokio::test]
    async fn test_confirm_payment_wrong_buyer_not_found() {
        let (gateway, screening_id) = seeded_gateway().await;
        let create_use_case = CreateHoldUseCase::new(gateway.clone(), &BookingConfig::default());
        let holds = create_use_case
            .execute(CreateHoldCommand {
                screening_id: screening_id.into_uuid(),
                seat_labels: vec!["E1".to_string()],
                buyer_id: "u1".to_string(),
            })
            .await
            .unwrap();

        let confirm_use_case = ConfirmPaymentUseCase::new(gateway.clone());
        let result = confirm_use_case
            .execute(ConfirmPaymentCommand {
                reservation_id: holds[0].reservation_id,
                buyer_id: "u2".to_string(),
            })
            .await;

        assert!(matches!(result, Err(BookingError::ReservationNotFound(_))));
    }

    #[tokio::test]
    async fn test_confirm_payment_group_confirm() {
        let (gateway, screening_id) = seeded_gateway().await;
        let create_use_case = CreateHoldUseCase::new(gateway.clone(), &BookingConfig::default());
        let holds = create_use_case
            .execute(CreateHoldCommand {
                screening_id: screening_id.into_uuid(),
                seat_labels: vec!["E1".to_string(), "E2".to_string(), "E3".to_string()],
                buyer_id: "u1".to_string(),
            })
            .await
            .unwrap();

        let middle = holds.iter().find(|r| r.seat_label == "E2").unwrap();

        let confirm_use_case = ConfirmPaymentUseCase::new(gateway.clone());
        let outcome = confirm_use_case
            .execute(ConfirmPaymentCommand {
                reservation_id: middle.reservation_id,
                buyer_id: "u1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.newly_created.len(), 3, "every sibling's sale must be reported for event publishing");
        assert_eq!(gateway.sale_count().await, 3);
        for hold in &holds {
            assert_eq!(
                gateway.reservation_status(ReservationId::from_uuid(hold.reservation_id)).await,
                ReservationStatus::Confirmed
            );
            assert_eq!(gateway.seat_status(SeatId::from_uuid(hold.seat_id)).await, SeatStatus::Sold);
        }
    }
}
