mod axum_handler;

pub use axum_handler::{health_check_handler, health_check_simple};
