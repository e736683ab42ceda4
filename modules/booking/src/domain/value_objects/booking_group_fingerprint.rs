// BookingGroupFingerprint - the derived key that identifies a multi-seat hold

use chrono::{DateTime, Utc};

use crate::domain::value_objects::ScreeningId;

/// Identifies the set of reservations created by a single multi-seat hold
/// request. Booking groups are never stored; this tuple is recomputed from
/// a reservation's own fields and used to look up its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookingGroupFingerprint {
    pub buyer_id: String,
    pub screening_id: ScreeningId,
    pub expires_at: DateTime<Utc>,
}

impl BookingGroupFingerprint {
    pub fn new(buyer_id: impl Into<String>, screening_id: ScreeningId, expires_at: DateTime<Utc>) -> Self {
        Self {
            buyer_id: buyer_id.into(),
            screening_id,
            expires_at,
        }
    }
}
