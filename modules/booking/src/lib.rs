//! Booking core -- the reservation state machine and its concurrency
//! control (C1-C5 of the system overview).
//!
//! This crate owns the hold/confirm/expire protocol for a strictly limited,
//! enumerable resource (cinema seats within a screening). It never speaks
//! HTTP and never provisions screenings or seats; `api-gateway` wires this
//! crate's [`application::use_cases::ReservationCoordinator`] into a process.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::BookingConfig;
pub use error::BookingError;
