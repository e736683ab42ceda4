// Use cases for the reservation state machine

mod confirm_payment_use_case;
mod create_hold_use_case;
mod expire_reservation_use_case;
mod reservation_coordinator;

pub use confirm_payment_use_case::ConfirmPaymentUseCase;
pub use create_hold_use_case::CreateHoldUseCase;
pub use expire_reservation_use_case::{ExpireOutcome, ExpireReservationUseCase};
pub use reservation_coordinator::ReservationCoordinator;
