// CreateHoldUseCase - the "Create Hold" operation of the Reservation Coordinator (4.4.1)

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};

use crate::application::dtos::{CreateHoldCommand, ReservationView};
use crate::domain::entities::Reservation;
use crate::domain::repositories::BookingGateway;
use crate::domain::value_objects::{ReservationId, ScreeningId, SeatId};
use crate::{BookingConfig, BookingError};

/// Creates one or more holds on seats within a single screening, all
/// sharing one `expires_at` deadline (the booking-group fingerprint).
pub struct CreateHoldUseCase<G>
where
    G: BookingGateway,
{
    gateway: Arc<G>,
    ttl: ChronoDuration,
}

impl<G> CreateHoldUseCase<G>
where
    G: BookingGateway,
{
    pub fn new(gateway: Arc<G>, config: &BookingConfig) -> Self {
        Self {
            gateway,
            ttl: ChronoDuration::from_std(config.reservation_ttl).expect("ttl fits in chrono::Duration"),
        }
    }

    /// Returns the created reservations alongside the reservation ids the
    /// caller should hand the Delay Scheduler and Event Publisher for — the
    /// Coordinator performs those post-commit side effects, not this
    /// use case, since they must never run inside the transaction.
    pub async fn execute(&self, command: CreateHoldCommand) -> Result<Vec<ReservationView>, BookingError> {
        if command.seat_labels.is_empty() {
            return Err(BookingError::EmptySeatLabels);
        }

        let mut sorted_labels = command.seat_labels.clone();
        sorted_labels.sort();
        for window in sorted_labels.windows(2) {
            if window[0] == window[1] {
                return Err(BookingError::DuplicateSeatLabel(window[0].clone()));
            }
        }

        let screening_id = ScreeningId::from_uuid(command.screening_id);
        let expires_at = Utc::now() + self.ttl;

        let mut session = self.gateway.begin().await?;

        if session.find_screening(screening_id).await?.is_none() {
            session.rollback().await?;
            return Err(BookingError::ScreeningNotFound(command.screening_id));
        }

        let mut created = Vec::with_capacity(sorted_labels.len());
        for label in &sorted_labels {
            let seat = match session.fetch_and_lock_seat(screening_id, label).await {
                Ok(Some(seat)) => seat,
                Ok(None) => {
                    session.rollback().await?;
                    return Err(BookingError::SeatNotFound(label.clone()));
                }
                Err(err) => {
                    session.rollback().await?;
                    return Err(err);
                }
            };

            if !seat.status().is_available() {
                session.rollback().await?;
                return Err(BookingError::SeatNotAvailable {
                    label: label.clone(),
                    status: seat.status().to_string(),
                });
            }

            let reservation = match Reservation::create(seat.id(), command.buyer_id.clone(), expires_at) {
                Ok(r) => r,
                Err(err) => {
                    session.rollback().await?;
                    return Err(err);
                }
            };

            if let Err(err) = session.update_seat_status(seat.id(), crate::domain::value_objects::SeatStatus::Reserved).await {
                session.rollback().await?;
                return Err(err);
            }
            if let Err(err) = session.insert_reservation(&reservation).await {
                session.rollback().await?;
                return Err(err);
            }

            created.push(reservation_view(&reservation, &seat));
        }

        session.commit().await?;

        Ok(created)
    }
}

fn reservation_view(reservation: &Reservation, seat: &crate::domain::entities::Seat) -> ReservationView {
    ReservationView {
        reservation_id: reservation.id().into_uuid(),
        seat_id: seat.id().into_uuid(),
        seat_label: seat.label().to_string(),
        buyer_id: reservation.buyer_id().to_string(),
        status: reservation.status().to_string(),
        expires_at: reservation.expires_at(),
    }
}

/// Extracts the `ReservationId`s created by a successful call, for the
/// Coordinator to hand to the Delay Scheduler after commit.
pub fn reservation_ids(views: &[ReservationView]) -> Vec<ReservationId> {
    views.iter().map(|v| ReservationId::from_uuid(v.reservation_id)).collect()
}

/// Extracts the originating `SeatId`s, unused by Create Hold itself but kept
/// alongside `reservation_ids` for symmetry with the Coordinator's
/// post-commit fan-out, which needs both ids per reservation.
#[allow(dead_code)]
pub fn seat_ids(views: &[ReservationView]) -> Vec<SeatId> {
    views.iter().map(|v| SeatId::from_uuid(v.seat_id)).collect()
}
