// Repository / port traits for the booking module

mod booking_gateway;
mod delay_scheduler;

pub use booking_gateway::{BookingGateway, BookingSession};
pub use delay_scheduler::DelayScheduler;
