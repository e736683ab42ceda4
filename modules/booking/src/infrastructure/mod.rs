// Infrastructure layer - broker-backed and store-backed port implementations

pub mod broker;
pub mod persistence;
pub mod retry;
