//! Runtime configuration for the booking core, loaded from the environment.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading or validating [`BookingConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange { name: &'static str, value: i64, min: i64, max: i64 },
}

/// Tunables for the reservation state machine's timing and retry behavior.
/// Defaults match the spec's configuration table exactly.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// How long a hold remains pending before it becomes eligible for expiration.
    pub reservation_ttl: Duration,
    /// Maximum number of attempts the retry wrapper makes on `STORE_CONFLICT`.
    pub max_retry_attempts: u32,
    /// Delay before the first retry.
    pub initial_retry_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub retry_backoff_multiplier: f64,
    /// Ceiling on the retry delay regardless of attempt count.
    pub max_retry_delay: Duration,
    /// Maximum number of expiration messages the consumer batches together.
    pub expiration_batch_size: usize,
    /// Maximum time the consumer waits to fill a batch before flushing it.
    pub expiration_flush_interval: Duration,
    /// Postgres connection string for the Inventory Store Gateway.
    pub database_url: String,
    /// AMQP connection string for the Delay Scheduler and Event Publisher.
    pub rabbitmq_url: String,
}

impl BookingConfig {
    /// Loads configuration from environment variables, applying `.env` via
    /// `dotenvy` if present. Fails fast on malformed or out-of-range values
    /// rather than silently clamping them.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let reservation_ttl_seconds = parse_ranged("RESERVATION_TTL_SECONDS", 30, 10, 3600)?;
        let max_retry_attempts = parse_u32("MAX_RETRY_ATTEMPTS", 3)?;
        let initial_retry_delay_ms = parse_u32("INITIAL_RETRY_DELAY_MS", 100)?;
        let retry_backoff_multiplier = parse_f64("RETRY_BACKOFF_MULTIPLIER", 2.0)?;
        let max_retry_delay_ms = parse_u32("MAX_RETRY_DELAY_MS", 2000)?;
        let expiration_batch_size = parse_u32("EXPIRATION_BATCH_SIZE", 10)?;
        let expiration_flush_interval_ms = parse_u32("EXPIRATION_FLUSH_INTERVAL_MS", 2000)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/booking".to_string());
        let rabbitmq_url =
            env::var("RABBITMQ_URL").unwrap_or_else(|_| "amqp://127.0.0.1:5672/%2f".to_string());

        Ok(Self {
            reservation_ttl: Duration::from_secs(reservation_ttl_seconds as u64),
            max_retry_attempts,
            initial_retry_delay: Duration::from_millis(initial_retry_delay_ms as u64),
            retry_backoff_multiplier,
            max_retry_delay: Duration::from_millis(max_retry_delay_ms as u64),
            expiration_batch_size: expiration_batch_size as usize,
            expiration_flush_interval: Duration::from_millis(expiration_flush_interval_ms as u64),
            database_url,
            rabbitmq_url,
        })
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            reservation_ttl: Duration::from_secs(30),
            max_retry_attempts: 3,
            initial_retry_delay: Duration::from_millis(100),
            retry_backoff_multiplier: 2.0,
            max_retry_delay: Duration::from_millis(2000),
            expiration_batch_size: 10,
            expiration_flush_interval: Duration::from_millis(2000),
            database_url: "postgres://localhost/booking".to_string(),
            rabbitmq_url: "amqp://127.0.0.1:5672/%2f".to_string(),
        }
    }
}

fn parse_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_ranged(name: &'static str, default: i64, min: i64, max: i64) -> Result<i64, ConfigError> {
    let value = match env::var(name) {
        Ok(raw) => raw
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw })?,
        Err(_) => default,
    };

    if value < min || value > max {
        return Err(ConfigError::OutOfRange { name, value, min, max });
    }

    Ok(value)
}
