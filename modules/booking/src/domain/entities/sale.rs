// Sale entity - an append-only record of a confirmed purchase

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ReservationId, SaleId, SeatId};

/// An append-only record of a confirmed purchase. Created exactly once when
/// a hold is confirmed; never mutated thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    seat_id: SeatId,
    buyer_id: String,
    reservation_id: ReservationId,
    amount: Decimal,
    paid_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl Sale {
    /// Creates a new sale. Every sibling in a confirmed booking group shares
    /// the same `paid_at` timestamp, captured once by the caller.
    pub fn create(
        seat_id: SeatId,
        buyer_id: impl Into<String>,
        reservation_id: ReservationId,
        amount: Decimal,
        paid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SaleId::new(),
            seat_id,
            buyer_id: buyer_id.into(),
            reservation_id,
            amount,
            paid_at,
            created_at: Utc::now(),
        }
    }

    /// Reconstitutes a Sale from persistence.
    pub fn reconstitute(
        id: SaleId,
        seat_id: SeatId,
        buyer_id: String,
        reservation_id: ReservationId,
        amount: Decimal,
        paid_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            seat_id,
            buyer_id,
            reservation_id,
            amount,
            paid_at,
            created_at,
        }
    }

    pub fn id(&self) -> SaleId {
        self.id
    }
    pub fn seat_id(&self) -> SeatId {
        self.seat_id
    }
    pub fn buyer_id(&self) -> &str {
        &self.buyer_id
    }
    pub fn reservation_id(&self) -> ReservationId {
        self.reservation_id
    }
    pub fn amount(&self) -> Decimal {
        self.amount
    }
    pub fn paid_at(&self) -> DateTime<Utc> {
        self.paid_at
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_sale() {
        let seat_id = SeatId::new();
        let reservation_id = ReservationId::new();
        let paid_at = Utc::now();

        let sale = Sale::create(seat_id, "u1", reservation_id, dec!(12.50), paid_at);

        assert_eq!(sale.seat_id(), seat_id);
        assert_eq!(sale.reservation_id(), reservation_id);
        assert_eq!(sale.amount(), dec!(12.50));
        assert_eq!(sale.paid_at(), paid_at);
    }
}
