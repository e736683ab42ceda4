//! Inventory Store Gateway port (C1).
//!
//! Exposes transactional sessions over seats, reservations and sales. Every
//! fetch-and-lock operation acquires an exclusive row-level lock held until
//! the session is committed or rolled back; this is the only path by which
//! the Reservation Coordinator touches durable state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{Reservation, Sale, Screening, Seat};
use crate::domain::value_objects::{ReservationId, ReservationStatus, ScreeningId, SeatId, SeatStatus};
use crate::BookingError;

/// A single transactional session against the store. Dropping a session
/// without calling `commit` must leave no durable effect; implementations
/// back this with a database transaction rolled back on drop.
#[async_trait]
pub trait BookingSession: Send {
    /// Looks up a screening without locking it (screenings are provisioned
    /// outside this core and never mutated by it).
    async fn find_screening(&mut self, screening_id: ScreeningId) -> Result<Option<Screening>, BookingError>;

    /// Fetches and exclusively locks the seat identified by `(screening_id, label)`.
    async fn fetch_and_lock_seat(
        &mut self,
        screening_id: ScreeningId,
        label: &str,
    ) -> Result<Option<Seat>, BookingError>;

    /// Fetches and exclusively locks a reservation together with its seat,
    /// constrained to `buyer_id`. A reservation that exists but belongs to a
    /// different buyer is reported identically to a missing reservation.
    async fn fetch_and_lock_reservation_for_buyer(
        &mut self,
        reservation_id: ReservationId,
        buyer_id: &str,
    ) -> Result<Option<(Reservation, Seat, Screening)>, BookingError>;

    /// Fetches and exclusively locks a reservation together with its seat,
    /// without constraining the buyer. Used by Expire, which is invoked by
    /// the system rather than by a specific buyer.
    async fn fetch_and_lock_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> Result<Option<(Reservation, Seat)>, BookingError>;

    /// Fetches and exclusively locks every `PENDING` reservation sharing the
    /// given booking-group fingerprint, each paired with its seat.
    async fn fetch_and_lock_pending_siblings(
        &mut self,
        buyer_id: &str,
        screening_id: ScreeningId,
        expires_at: DateTime<Utc>,
    ) -> Result<Vec<(Reservation, Seat)>, BookingError>;

    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<(), BookingError>;

    async fn insert_sale(&mut self, sale: &Sale) -> Result<(), BookingError>;

    async fn update_seat_status(&mut self, seat_id: SeatId, status: SeatStatus) -> Result<(), BookingError>;

    async fn update_reservation_status(
        &mut self,
        reservation_id: ReservationId,
        status: ReservationStatus,
    ) -> Result<(), BookingError>;

    async fn find_sale_by_reservation(&mut self, reservation_id: ReservationId) -> Result<Option<Sale>, BookingError>;

    /// Commits the session, making every effect durable.
    async fn commit(self: Box<Self>) -> Result<(), BookingError>;

    /// Rolls back the session, discarding every effect.
    async fn rollback(self: Box<Self>) -> Result<(), BookingError>;
}

/// Opens transactional sessions against the durable store.
#[async_trait]
pub trait BookingGateway: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn BookingSession>, BookingError>;
}
