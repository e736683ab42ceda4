//! Application layer for the booking module.
//!
//! Use cases orchestrate domain entities and the Inventory Store Gateway to
//! implement the Create Hold / Confirm Payment / Expire operations; the
//! [`use_cases::ReservationCoordinator`] composes all three with retry and
//! post-commit event fan-out. DTOs carry plain types across this boundary so
//! callers never need the domain's value objects.

pub mod dtos;
pub mod use_cases;
