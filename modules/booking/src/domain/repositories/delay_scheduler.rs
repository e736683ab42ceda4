//! Delay Scheduler port (C2).
//!
//! Durably enqueues an expiration payload such that, after approximately
//! `delay` wall-clock time has elapsed, it becomes deliverable to the
//! Expiration Consumer. Delivery is at-least-once; the scheduler is not
//! trusted for ordering, precision, or exactly-once delivery. The
//! Reservation Coordinator's expire operation is the sole authority on
//! whether expiration should actually occur.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::value_objects::ReservationId;
use crate::BookingError;

#[async_trait]
pub trait DelayScheduler: Send + Sync {
    /// Schedules `reservation_id` to become deliverable to the Expiration
    /// Consumer after `delay` has elapsed.
    async fn schedule_expiration(&self, reservation_id: ReservationId, delay: Duration) -> Result<(), BookingError>;
}
