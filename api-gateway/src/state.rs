// Application state for the booking core's process wiring
//
// `api-gateway` carries no booking HTTP surface -- the reservation state
// machine is driven by the command surface in `booking::application`, not
// by this process's router. What lives here is the ambient wiring a
// deployable core needs regardless: the store pool and the coordinator
// built on top of it, held for the lifetime of the process.

use std::sync::Arc;

use booking::application::use_cases::ReservationCoordinator;
use booking::infrastructure::broker::RabbitMqDelayScheduler;
use booking::infrastructure::persistence::PgBookingGateway;
use events::RabbitMqEventPublisher;
use sqlx::PgPool;

/// The reservation coordinator as this process instantiates it: a
/// Postgres-backed store gateway, a RabbitMQ-backed delay scheduler, and a
/// RabbitMQ-backed event publisher.
pub type Coordinator = ReservationCoordinator<PgBookingGateway, RabbitMqDelayScheduler, RabbitMqEventPublisher>;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    coordinator: Arc<Coordinator>,
}

impl AppState {
    pub fn new(pool: PgPool, coordinator: Arc<Coordinator>) -> Self {
        Self { pool, coordinator }
    }

    /// Returns the Postgres pool backing the Inventory Store Gateway.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns the reservation coordinator (C4), the sole entry point into
    /// the booking core's use cases.
    pub fn coordinator(&self) -> Arc<Coordinator> {
        self.coordinator.clone()
    }
}
