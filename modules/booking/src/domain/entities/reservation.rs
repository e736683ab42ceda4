// Reservation entity - a time-bounded exclusive hold on one seat

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{BookingGroupFingerprint, ReservationId, ReservationStatus, ScreeningId, SeatId};
use crate::BookingError;

/// A time-bounded exclusive claim on exactly one seat by one buyer.
/// Created by the Coordinator; mutated only by the Coordinator; never
/// physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    seat_id: SeatId,
    buyer_id: String,
    status: ReservationStatus,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Creates a new pending hold. `expires_at` must lie in the future;
    /// Create Hold computes one shared deadline for an entire booking group
    /// before calling this for each seat.
    pub fn create(seat_id: SeatId, buyer_id: impl Into<String>, expires_at: DateTime<Utc>) -> Result<Self, BookingError> {
        if expires_at <= Utc::now() {
            return Err(BookingError::InvalidState(
                "reservation expires_at must be in the future".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: ReservationId::new(),
            seat_id,
            buyer_id: buyer_id.into(),
            status: ReservationStatus::Pending,
            expires_at,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitutes a Reservation from persistence.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ReservationId,
        seat_id: SeatId,
        buyer_id: String,
        status: ReservationStatus,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            seat_id,
            buyer_id,
            status,
            expires_at,
            created_at,
            updated_at,
        }
    }

    /// Converts a pending hold into a confirmed sale. Legal only from
    /// `PENDING`.
    pub fn confirm(&mut self) -> Result<(), BookingError> {
        if self.status != ReservationStatus::Pending {
            return Err(BookingError::ReservationNotPending(self.status.to_string()));
        }
        self.status = ReservationStatus::Confirmed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Releases a pending hold whose deadline has passed. Legal only from
    /// `PENDING`; calling it on an already-terminal reservation is a no-op
    /// handled by the caller (idempotency), not by this method.
    pub fn expire(&mut self) -> Result<(), BookingError> {
        if self.status != ReservationStatus::Pending {
            return Err(BookingError::ReservationNotPending(self.status.to_string()));
        }
        self.status = ReservationStatus::Expired;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Returns true if `at` is past this reservation's deadline.
    pub fn is_past_deadline(&self, at: DateTime<Utc>) -> bool {
        at > self.expires_at
    }

    /// The booking-group fingerprint this reservation belongs to.
    pub fn group_fingerprint(&self, screening_id: ScreeningId) -> BookingGroupFingerprint {
        BookingGroupFingerprint::new(self.buyer_id.clone(), screening_id, self.expires_at)
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }
    pub fn seat_id(&self) -> SeatId {
        self.seat_id
    }
    pub fn buyer_id(&self) -> &str {
        &self.buyer_id
    }
    pub fn status(&self) -> ReservationStatus {
        self.status
    }
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn future_time() -> DateTime<Utc> {
        Utc::now() + Duration::seconds(30)
    }

    #[test]
    fn test_create_reservation() {
        let seat_id = SeatId::new();
        let expires_at = future_time();
        let reservation = Reservation::create(seat_id, "u1", expires_at).unwrap();

        assert_eq!(reservation.seat_id(), seat_id);
        assert_eq!(reservation.buyer_id(), "u1");
        assert_eq!(reservation.status(), ReservationStatus::Pending);
        assert_eq!(reservation.expires_at(), expires_at);
    }

    #[test]
    fn test_create_rejects_past_deadline() {
        let past = Utc::now() - Duration::seconds(1);
        let err = Reservation::create(SeatId::new(), "u1", past).unwrap_err();
        assert!(matches!(err, BookingError::InvalidState(_)));
    }

    #[test]
    fn test_confirm_from_pending() {
        let mut reservation = Reservation::create(SeatId::new(), "u1", future_time()).unwrap();
        reservation.confirm().unwrap();
        assert_eq!(reservation.status(), ReservationStatus::Confirmed);
    }

    #[test]
    fn test_confirm_twice_fails() {
        let mut reservation = Reservation::create(SeatId::new(), "u1", future_time()).unwrap();
        reservation.confirm().unwrap();
        let err = reservation.confirm().unwrap_err();
        assert!(matches!(err, BookingError::ReservationNotPending(_)));
    }

    #[test]
    fn test_expire_from_pending() {
        let mut reservation = Reservation::create(SeatId::new(), "u1", future_time()).unwrap();
        reservation.expire().unwrap();
        assert_eq!(reservation.status(), ReservationStatus::Expired);
    }

    #[test]
    fn test_is_past_deadline() {
        let reservation = Reservation::create(SeatId::new(), "u1", future_time()).unwrap();
        assert!(!reservation.is_past_deadline(Utc::now()));
        assert!(reservation.is_past_deadline(Utc::now() + Duration::minutes(5)));
    }

    #[test]
    fn test_group_fingerprint_shared_by_siblings() {
        let expires_at = future_time();
        let screening_id = ScreeningId::new();
        let r1 = Reservation::create(SeatId::new(), "u1", expires_at).unwrap();
        let r2 = Reservation::create(SeatId::new(), "u1", expires_at).unwrap();

        assert_eq!(r1.group_fingerprint(screening_id), r2.group_fingerprint(screening_id));
    }
}
