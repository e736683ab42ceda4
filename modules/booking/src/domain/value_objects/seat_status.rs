// SeatStatus enum - status of a seat within a screening

use crate::BookingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a seat within a screening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    /// Seat is free and may be held
    Available,
    /// Seat is held by a pending reservation
    Reserved,
    /// Seat has been paid for; terminal
    Sold,
}

impl SeatStatus {
    /// Returns all available seat statuses
    pub fn all() -> &'static [SeatStatus] {
        &[SeatStatus::Available, SeatStatus::Reserved, SeatStatus::Sold]
    }

    /// Returns true if the seat may be held by a new reservation
    pub fn is_available(&self) -> bool {
        matches!(self, SeatStatus::Available)
    }

    /// Returns true if the seat has been sold (terminal, never releases)
    pub fn is_sold(&self) -> bool {
        matches!(self, SeatStatus::Sold)
    }
}

impl FromStr for SeatStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(SeatStatus::Available),
            "reserved" => Ok(SeatStatus::Reserved),
            "sold" => Ok(SeatStatus::Sold),
            other => Err(BookingError::InvalidState(format!(
                "unrecognised seat status value: {other}"
            ))),
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatStatus::Available => write!(f, "available"),
            SeatStatus::Reserved => write!(f, "reserved"),
            SeatStatus::Sold => write!(f, "sold"),
        }
    }
}
