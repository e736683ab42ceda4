// Domain entities for the booking core

mod screening;
mod seat;
mod reservation;
mod sale;

pub use screening::Screening;
pub use seat::Seat;
pub use reservation::Reservation;
pub use sale::Sale;
