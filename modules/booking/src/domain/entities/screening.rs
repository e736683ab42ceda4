// Screening entity - one scheduled showing; read-mostly from the core's
// perspective, since provisioning screenings and seats happens elsewhere.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ScreeningId;

/// A scheduled showing of a film in a specific room at a specific time.
/// Owns a fixed seat inventory provisioned outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Screening {
    id: ScreeningId,
    movie_name: String,
    start_time: DateTime<Utc>,
    room_number: i32,
    ticket_price: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Screening {
    /// Reconstitutes a Screening from persistence. The core never creates
    /// screenings itself; they are provisioned by an external collaborator.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ScreeningId,
        movie_name: String,
        start_time: DateTime<Utc>,
        room_number: i32,
        ticket_price: Decimal,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            movie_name,
            start_time,
            room_number,
            ticket_price,
            is_active,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> ScreeningId {
        self.id
    }
    pub fn movie_name(&self) -> &str {
        &self.movie_name
    }
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }
    pub fn room_number(&self) -> i32 {
        self.room_number
    }
    pub fn ticket_price(&self) -> Decimal {
        self.ticket_price
    }
    pub fn is_active(&self) -> bool {
        self.is_active
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
    use rust_decimal_macros::dec;

    fn sample() -> Screening {
        Screening::reconstitute(
            ScreeningId::new(),
            "Interstellar".to_string(),
            Utc::now(),
            3,
            dec!(12.50),
            true,
            Utc::now(),
            Utc::now(),
        )
    }

    #[test]
    fn test_getters() {
        let screening = sample();
        assert_eq!(screening.movie_name(), "Interstellar");
        assert_eq!(screening.room_number(), 3);
        assert_eq!(screening.ticket_price(), dec!(12.50));
        assert!(screening.is_active());
    }
}
