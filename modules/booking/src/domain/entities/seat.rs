// Seat entity - one bookable position within a screening

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ScreeningId, SeatId, SeatStatus};
use crate::BookingError;

/// One bookable position within a screening. Created once when the
/// screening is provisioned; never destroyed. Status transitions are driven
/// solely by the Reservation Coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    id: SeatId,
    screening_id: ScreeningId,
    label: String,
    row: String,
    status: SeatStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Seat {
    /// Reconstitutes a Seat from persistence. Seats are provisioned outside
    /// this core; it only ever mutates an existing row's status.
    pub fn reconstitute(
        id: SeatId,
        screening_id: ScreeningId,
        label: String,
        row: String,
        status: SeatStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            screening_id,
            label,
            row,
            status,
            created_at,
            updated_at,
        }
    }

    /// Places the seat under an exclusive hold. Legal only from `AVAILABLE`.
    pub fn reserve(&mut self) -> Result<(), BookingError> {
        if self.status != SeatStatus::Available {
            return Err(BookingError::SeatNotAvailable {
                label: self.label.clone(),
                status: self.status.to_string(),
            });
        }
        self.status = SeatStatus::Reserved;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the seat as sold. Terminal: a sold seat never transitions again.
    pub fn sell(&mut self) -> Result<(), BookingError> {
        if self.status != SeatStatus::Reserved {
            return Err(BookingError::InvalidState(format!(
                "cannot sell seat {} from status {}",
                self.label, self.status
            )));
        }
        self.status = SeatStatus::Sold;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Releases the seat back to the pool. Only legal from `RESERVED`; a
    /// `SOLD` seat may never re-enter `AVAILABLE`.
    pub fn release(&mut self) -> Result<(), BookingError> {
        if self.status == SeatStatus::Sold {
            return Err(BookingError::InvalidState(format!(
                "seat {} is sold and cannot be released",
                self.label
            )));
        }
        self.status = SeatStatus::Available;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn id(&self) -> SeatId {
        self.id
    }
    pub fn screening_id(&self) -> ScreeningId {
        self.screening_id
    }
    pub fn label(&self) -> &str {
        &self.label
    }
    pub fn row(&self) -> &str {
        &self.row
    }
    pub fn status(&self) -> SeatStatus {
        self.status
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

    fn available_seat() -> Seat {
        Seat::reconstitute(
            SeatId::new(),
            ScreeningId::new(),
            "A3".to_string(),
            "A".to_string(),
            SeatStatus::Available,
            Utc::now(),
            Utc::now(),
        )
    }

    #[test]
    fn test_reserve_from_available() {
        let mut seat = available_seat();
        seat.reserve().unwrap();
        assert_eq!(seat.status(), SeatStatus::Reserved);
    }

    #[test]
    fn test_reserve_twice_fails() {
        let mut seat = available_seat();
        seat.reserve().unwrap();
        let err = seat.reserve().unwrap_err();
        assert!(matches!(err, BookingError::SeatNotAvailable { .. }));
    }

    #[test]
    fn test_sell_from_reserved() {
        let mut seat = available_seat();
        seat.reserve().unwrap();
        seat.sell().unwrap();
        assert_eq!(seat.status(), SeatStatus::Sold);
    }

    #[test]
    fn test_sell_from_available_fails() {
        let mut seat = available_seat();
        assert!(seat.sell().is_err());
    }

    #[test]
    fn test_release_from_reserved() {
        let mut seat = available_seat();
        seat.reserve().unwrap();
        seat.release().unwrap();
        assert_eq!(seat.status(), SeatStatus::Available);
    }

    #[test]
    fn test_sold_seat_never_releases() {
        let mut seat = available_seat();
        seat.reserve().unwrap();
        seat.sell().unwrap();
        let err = seat.release().unwrap_err();
        assert!(matches!(err, BookingError::InvalidState(_)));
        assert_eq!(seat.status(), SeatStatus::Sold);
    }
}
