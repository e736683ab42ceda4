// Data Transfer Objects for the booking application boundary
//
// Commands use primitive types (String, Uuid) rather than domain value
// objects, matching the language-agnostic command surface this core
// consumes; use cases parse them into value objects before touching domain
// entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Commands
// =============================================================================

/// `CreateHold { screeningId, seatLabels, userId }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHoldCommand {
    pub screening_id: Uuid,
    pub seat_labels: Vec<String>,
    pub buyer_id: String,
}

/// `ConfirmPayment { reservationId, userId }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentCommand {
    pub reservation_id: Uuid,
    pub buyer_id: String,
}

/// `ExpireReservation { reservationId }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpireReservationCommand {
    pub reservation_id: Uuid,
}

// =============================================================================
// Responses
// =============================================================================

/// One reservation created by a Create Hold call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationView {
    pub reservation_id: Uuid,
    pub seat_id: Uuid,
    pub seat_label: String,
    pub buyer_id: String,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

/// The sale record returned by a successful Confirm Payment call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleView {
    pub sale_id: Uuid,
    pub reservation_id: Uuid,
    pub seat_id: Uuid,
    pub seat_label: String,
    pub movie_name: String,
    pub room_number: i32,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
}
