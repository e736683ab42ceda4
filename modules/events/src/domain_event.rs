// DomainEvent - the fan-out payload published after a committed transaction

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A domain event published strictly after its triggering transaction has
/// committed. No phantom events can arise from rolled-back state because
/// nothing ever constructs one before the commit succeeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    ReservationCreated {
        reservation_id: Uuid,
        seat_id: Uuid,
        seat_label: String,
        user_id: String,
        expires_at: DateTime<Utc>,
    },
    PaymentConfirmed {
        sale_id: Uuid,
        reservation_id: Uuid,
        seat_id: Uuid,
        seat_label: String,
        user_id: String,
        amount: Decimal,
    },
    ReservationExpired {
        reservation_id: Uuid,
        seat_id: Uuid,
        seat_label: String,
        user_id: String,
    },
    SeatReleased {
        seat_id: Uuid,
        seat_label: String,
        screening_id: Uuid,
    },
}

impl DomainEvent {
    /// The routing key / event name used for the broker's fan-out destination.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::ReservationCreated { .. } => "reservation.created",
            DomainEvent::PaymentConfirmed { .. } => "payment.confirmed",
            DomainEvent::ReservationExpired { .. } => "reservation.expired",
            DomainEvent::SeatReleased { .. } => "seat.released",
        }
    }
}
