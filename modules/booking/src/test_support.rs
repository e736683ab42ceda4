//! In-memory test doubles for the booking core's ports.
//!
//! `InMemoryBookingGateway` holds one global lock for the lifetime of each
//! session, which is coarser than the real gateway's per-row locking, but a
//! session buffers its writes in an overlay and only merges them into the
//! shared store on `commit`; `rollback` simply discards the overlay. That
//! preserves the contract the Coordinator depends on -- no partial holds,
//! no effects visible before commit -- without a live Postgres.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::{Reservation, Sale, Screening, Seat};
use crate::domain::repositories::{BookingGateway, BookingSession, DelayScheduler};
use crate::domain::value_objects::{ReservationId, ReservationStatus, ScreeningId, SeatId, SeatStatus};
use crate::BookingError;

#[derive(Default, Clone)]
pub struct FakeState {
    pub screenings: HashMap<ScreeningId, Screening>,
    pub seats: HashMap<SeatId, Seat>,
    pub seat_by_label: HashMap<(ScreeningId, String), SeatId>,
    pub reservations: HashMap<ReservationId, Reservation>,
    pub sales: HashMap<ReservationId, Sale>,
}

pub struct InMemoryBookingGateway {
    state: Arc<Mutex<FakeState>>,
}

impl InMemoryBookingGateway {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    pub async fn seed_screening(&self, screening: Screening) {
        let mut state = self.state.lock().await;
        state.screenings.insert(screening.id(), screening);
    }

    pub async fn seed_seat(&self, seat: Seat) {
        let mut state = self.state.lock().await;
        state.seat_by_label.insert((seat.screening_id(), seat.label().to_string()), seat.id());
        state.seats.insert(seat.id(), seat);
    }

    pub async fn seat_status(&self, seat_id: SeatId) -> SeatStatus {
        self.state.lock().await.seats.get(&seat_id).unwrap().status()
    }

    pub async fn reservation_status(&self, reservation_id: ReservationId) -> ReservationStatus {
        self.state.lock().await.reservations.get(&reservation_id).unwrap().status()
    }

    pub async fn sale_count(&self) -> usize {
        self.state.lock().await.sales.len()
    }

    /// All seats currently known to the fake, for invariant checks that need
    /// to scan every seat rather than one at a time.
    pub async fn all_seats(&self) -> Vec<Seat> {
        self.state.lock().await.seats.values().cloned().collect()
    }

    /// All reservations currently known to the fake.
    pub async fn all_reservations(&self) -> Vec<Reservation> {
        self.state.lock().await.reservations.values().cloned().collect()
    }

    /// All sales currently known to the fake.
    pub async fn all_sales(&self) -> Vec<Sale> {
        self.state.lock().await.sales.values().cloned().collect()
    }
}

impl Default for InMemoryBookingGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingGateway for InMemoryBookingGateway {
    async fn begin(&self) -> Result<Box<dyn BookingSession>, BookingError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(InMemoryBookingSession {
            base: Some(guard),
            overlay: FakeState::default(),
        }))
    }
}

/// A session's overlay shadows the base store: reads consult the overlay
/// first and fall back to the base, writes only ever touch the overlay.
pub struct InMemoryBookingSession {
    base: Option<OwnedMutexGuard<FakeState>>,
    overlay: FakeState,
}

impl InMemoryBookingSession {
    fn base(&self) -> &FakeState {
        self.base.as_deref().expect("session used after commit/rollback")
    }

    fn seat(&self, id: SeatId) -> Option<Seat> {
        self.overlay.seats.get(&id).or_else(|| self.base().seats.get(&id)).cloned()
    }

    fn reservation(&self, id: ReservationId) -> Option<Reservation> {
        self.overlay
            .reservations
            .get(&id)
            .or_else(|| self.base().reservations.get(&id))
            .cloned()
    }

    fn seat_id_for_label(&self, screening_id: ScreeningId, label: &str) -> Option<SeatId> {
        let key = (screening_id, label.to_string());
        self.overlay
            .seat_by_label
            .get(&key)
            .or_else(|| self.base().seat_by_label.get(&key))
            .copied()
    }

    fn all_reservations(&self) -> Vec<Reservation> {
        let mut merged: HashMap<ReservationId, Reservation> = self.base().reservations.clone();
        merged.extend(self.overlay.reservations.clone());
        merged.into_values().collect()
    }
}

#[async_trait]
impl BookingSession for InMemoryBookingSession {
    async fn find_screening(&mut self, screening_id: ScreeningId) -> Result<Option<Screening>, BookingError> {
        Ok(self.base().screenings.get(&screening_id).cloned())
    }

    async fn fetch_and_lock_seat(
        &mut self,
        screening_id: ScreeningId,
        label: &str,
    ) -> Result<Option<Seat>, BookingError> {
        Ok(self.seat_id_for_label(screening_id, label).and_then(|id| self.seat(id)))
    }

    async fn fetch_and_lock_reservation_for_buyer(
        &mut self,
        reservation_id: ReservationId,
        buyer_id: &str,
    ) -> Result<Option<(Reservation, Seat, Screening)>, BookingError> {
        let Some(reservation) = self.reservation(reservation_id) else {
            return Ok(None);
        };
        if reservation.buyer_id() != buyer_id {
            return Ok(None);
        }
        let seat = self.seat(reservation.seat_id()).expect("seat must exist");
        let screening = self.base().screenings.get(&seat.screening_id()).cloned().expect("screening must exist");
        Ok(Some((reservation, seat, screening)))
    }

    async fn fetch_and_lock_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> Result<Option<(Reservation, Seat)>, BookingError> {
        let Some(reservation) = self.reservation(reservation_id) else {
            return Ok(None);
        };
        let seat = self.seat(reservation.seat_id()).expect("seat must exist");
        Ok(Some((reservation, seat)))
    }

    async fn fetch_and_lock_pending_siblings(
        &mut self,
        buyer_id: &str,
        screening_id: ScreeningId,
        expires_at: DateTime<Utc>,
    ) -> Result<Vec<(Reservation, Seat)>, BookingError> {
        let mut siblings: Vec<(Reservation, Seat)> = self
            .all_reservations()
            .into_iter()
            .filter(|r| r.buyer_id() == buyer_id && r.expires_at() == expires_at && r.status() == ReservationStatus::Pending)
            .filter_map(|r| {
                let seat = self.seat(r.seat_id())?;
                if seat.screening_id() != screening_id {
                    return None;
                }
                Some((r, seat))
            })
            .collect();
        siblings.sort_by(|a, b| a.1.label().cmp(b.1.label()));
        Ok(siblings)
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<(), BookingError> {
        self.overlay.reservations.insert(reservation.id(), reservation.clone());
        Ok(())
    }

    async fn insert_sale(&mut self, sale: &Sale) -> Result<(), BookingError> {
        self.overlay.sales.insert(sale.reservation_id(), sale.clone());
        Ok(())
    }

    async fn update_seat_status(&mut self, seat_id: SeatId, status: SeatStatus) -> Result<(), BookingError> {
        let mut seat = self.seat(seat_id).ok_or(BookingError::SeatNotFound(seat_id.into_uuid().to_string()))?;
        match status {
            SeatStatus::Available => seat.release()?,
            SeatStatus::Reserved => seat.reserve()?,
            SeatStatus::Sold => seat.sell()?,
        }
        self.overlay.seats.insert(seat_id, seat);
        Ok(())
    }

    async fn update_reservation_status(
        &mut self,
        reservation_id: ReservationId,
        status: ReservationStatus,
    ) -> Result<(), BookingError> {
        let mut reservation = self
            .reservation(reservation_id)
            .ok_or(BookingError::ReservationNotFound(reservation_id.into_uuid()))?;
        match status {
            ReservationStatus::Confirmed => reservation.confirm()?,
            ReservationStatus::Expired => reservation.expire()?,
            other => {
                return Err(BookingError::InvalidState(format!(
                    "test double does not support transitioning to {other}"
                )))
            }
        }
        self.overlay.reservations.insert(reservation_id, reservation);
        Ok(())
    }

    async fn find_sale_by_reservation(&mut self, reservation_id: ReservationId) -> Result<Option<Sale>, BookingError> {
        Ok(self
            .overlay
            .sales
            .get(&reservation_id)
            .or_else(|| self.base().sales.get(&reservation_id))
            .cloned())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), BookingError> {
        let mut base = self.base.take().expect("session used after commit/rollback");
        base.seats.extend(self.overlay.seats.drain());
        base.reservations.extend(self.overlay.reservations.drain());
        base.sales.extend(self.overlay.sales.drain());
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), BookingError> {
        self.base.take();
        Ok(())
    }
}

/// Records every call made to it; used to assert on scheduling side effects
/// without a real broker.
pub struct RecordingDelayScheduler {
    pub calls: StdMutex<Vec<(ReservationId, Duration)>>,
}

impl RecordingDelayScheduler {
    pub fn new() -> Self {
        Self {
            calls: StdMutex::new(Vec::new()),
        }
    }
}

impl Default for RecordingDelayScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DelayScheduler for RecordingDelayScheduler {
    async fn schedule_expiration(&self, reservation_id: ReservationId, delay: Duration) -> Result<(), BookingError> {
        self.calls.lock().unwrap().push((reservation_id, delay));
        Ok(())
    }
}

/// Records every published event; used to assert on post-commit publishing
/// without a real broker.
pub struct RecordingEventPublisher {
    pub events: StdMutex<Vec<events::DomainEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self {
            events: StdMutex::new(Vec::new()),
        }
    }
}

impl Default for RecordingEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl events::EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: events::DomainEvent) -> Result<(), events::EventsError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
