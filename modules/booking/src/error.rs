//! Booking module error types.
//!
//! This module defines the error taxonomy for the reservation state machine
//! and its concurrency control. Errors are categorized by how the caller is
//! expected to react: surfaced-and-final, retried-internally, or logged only.

use thiserror::Error;
use uuid::Uuid;

/// Error type for all booking module operations.
#[derive(Debug, Error)]
pub enum BookingError {
    // -------------------------------------------------------------------------
    // Not found
    // -------------------------------------------------------------------------

    /// The referenced screening does not exist.
    #[error("Session {0} not found")]
    ScreeningNotFound(Uuid),

    /// The referenced seat does not exist within its screening.
    #[error("Seat not found: {0}")]
    SeatNotFound(String),

    /// The referenced reservation does not exist, or does not belong to the
    /// caller. Ownership mismatches are reported identically to a missing
    /// reservation so a caller cannot distinguish "not mine" from "gone".
    #[error("Reservation not found: {0}")]
    ReservationNotFound(Uuid),

    /// The referenced sale does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(Uuid),

    // -------------------------------------------------------------------------
    // Conflict
    // -------------------------------------------------------------------------

    /// A requested seat is not currently available.
    #[error("Seat {label} is not available (current status: {status})")]
    SeatNotAvailable { label: String, status: String },

    /// The reservation is not in a state that allows confirmation.
    #[error("Reservation is not pending (status: {0})")]
    ReservationNotPending(String),

    /// The reservation's hold deadline has already passed.
    #[error("Reservation has expired")]
    ReservationExpired,

    // -------------------------------------------------------------------------
    // Invalid request
    // -------------------------------------------------------------------------

    /// The caller supplied a seat label more than once in a single hold request.
    #[error("Duplicate seat label in request: {0}")]
    DuplicateSeatLabel(String),

    /// The caller supplied an empty seat label list.
    #[error("Seat label list must not be empty")]
    EmptySeatLabels,

    // -------------------------------------------------------------------------
    // Store errors
    // -------------------------------------------------------------------------

    /// Deadlock, serialization failure, or lock timeout. Retryable by the
    /// caller with fresh randomness.
    #[error("Store conflict: {0}")]
    StoreConflict(String),

    /// The store is unreachable (connection lost, host down).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A database error that did not classify into a more specific kind.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // -------------------------------------------------------------------------
    // Broker errors
    // -------------------------------------------------------------------------

    /// Could not publish a domain event or schedule an expiration after a
    /// commit. Never surfaced to the caller of a command that already
    /// committed; logged for operational alerting instead.
    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),

    // -------------------------------------------------------------------------
    // Timeout and structural errors
    // -------------------------------------------------------------------------

    /// The caller's deadline elapsed before the operation completed.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// An inconsistency was detected that should be structurally impossible
    /// (e.g. a `CONFIRMED` reservation with no sale). Surfaced as an internal
    /// error; never silently papered over.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl BookingError {
    /// Returns true if the Coordinator's retry wrapper should attempt this
    /// operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::StoreConflict(_))
    }

    /// Classifies a raw sqlx error into the store-level kinds the spec
    /// distinguishes, inspecting the Postgres SQLSTATE code when available.
    /// `40001` (serialization_failure) and `40P01` (deadlock_detected) are
    /// retryable; everything else from the driver is treated as a store
    /// outage.
    pub fn classify_store_error(err: sqlx::Error) -> BookingError {
        if let sqlx::Error::Database(ref db_err) = err {
            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    "40001" | "40P01" => {
                        return BookingError::StoreConflict(db_err.message().to_string());
                    }
                    _ => {}
                }
            }
        }

        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                BookingError::StoreUnavailable(err.to_string())
            }
            other => BookingError::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflict_is_retryable() {
        let err = BookingError::StoreConflict("deadlock detected".to_string());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        let err = BookingError::ReservationNotFound(Uuid::nil());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_pool_timeout_is_store_unavailable() {
        let classified = BookingError::classify_store_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(classified, BookingError::StoreUnavailable(_)));
    }
}
