// Postgres-backed Inventory Store Gateway (C1)

mod pg_booking_gateway;

pub use pg_booking_gateway::PgBookingGateway;
