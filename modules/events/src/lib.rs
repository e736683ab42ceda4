// Events module - domain event envelope and publisher (C3)
//
// Clean Architecture layers kept flat here since the module is a single
// concern: a shared envelope type, the port that emits it, and one
// broker-backed implementation.

mod domain_event;
mod error;
mod publisher;
mod rabbitmq_publisher;

pub use domain_event::DomainEvent;
pub use error::EventsError;
pub use publisher::EventPublisher;
pub use rabbitmq_publisher::RabbitMqEventPublisher;
