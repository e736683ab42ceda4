// Domain value objects for the booking core

// ID value objects
mod seat_id;
mod screening_id;
mod reservation_id;
mod sale_id;

// Enum value objects
mod seat_status;
mod reservation_status;

// Derived key
mod booking_group_fingerprint;

// Re-exports - ID value objects
pub use seat_id::SeatId;
pub use screening_id::ScreeningId;
pub use reservation_id::ReservationId;
pub use sale_id::SaleId;

// Re-exports - Enum value objects
pub use seat_status::SeatStatus;
pub use reservation_status::ReservationStatus;

// Re-exports - Derived key
pub use booking_group_fingerprint::BookingGroupFingerprint;
