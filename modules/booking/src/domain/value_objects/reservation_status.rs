// ReservationStatus enum - status of a reservation (hold)

use crate::BookingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a reservation.
///
/// `Cancelled` is part of the DAG but is never produced by any operation in
/// this core; it is reserved for a future user-initiated cancel workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Hold is active; the seat is locked for this buyer until `expires_at`
    Pending,
    /// Hold was converted into a sale
    Confirmed,
    /// Hold lapsed past `expires_at` without confirmation
    Expired,
    /// Hold was cancelled (not reachable from this core's operations)
    Cancelled,
}

impl ReservationStatus {
    pub fn all() -> &'static [ReservationStatus] {
        &[
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
            ReservationStatus::Expired,
            ReservationStatus::Cancelled,
        ]
    }

    /// Returns true if the reservation still holds its seat
    pub fn is_pending(&self) -> bool {
        matches!(self, ReservationStatus::Pending)
    }

    /// Returns true if the reservation reached one of its terminal states
    pub fn is_finalized(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Confirmed | ReservationStatus::Expired | ReservationStatus::Cancelled
        )
    }
}

impl FromStr for ReservationStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "expired" => Ok(ReservationStatus::Expired),
            "cancelled" | "canceled" => Ok(ReservationStatus::Cancelled),
            other => Err(BookingError::InvalidState(format!(
                "unrecognised reservation status value: {other}"
            ))),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Pending => write!(f, "pending"),
            ReservationStatus::Confirmed => write!(f, "confirmed"),
            ReservationStatus::Expired => write!(f, "expired"),
            ReservationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
