// API Gateway - process wiring for the booking core
//
// This binary owns no seat-booking REST surface: it loads configuration,
// opens the store pool and the broker connections, builds the reservation
// coordinator (C4) on top of them, spawns the expiration consumer (C5) as
// a background task, and serves `/health`. The booking core's actual
// command surface (`booking::application::use_cases::ReservationCoordinator`)
// is consumed by whatever process wiring needs it -- this one included --
// rather than exposed over HTTP here.

mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use booking::application::use_cases::ReservationCoordinator;
use booking::infrastructure::broker::{ExpirationConsumer, RabbitMqDelayScheduler};
use booking::infrastructure::persistence::PgBookingGateway;
use booking::BookingConfig;
use common::health::infrastructure::health_check_simple;
use events::RabbitMqEventPublisher;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting tracing subscriber")?;

    let config = BookingConfig::from_env().context("loading booking configuration")?;

    info!("connecting to store...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("connecting to the inventory store")?;

    info!("connecting to broker...");
    let gateway = Arc::new(PgBookingGateway::new(pool.clone()));
    let scheduler = Arc::new(
        RabbitMqDelayScheduler::connect(&config.rabbitmq_url)
            .await
            .context("connecting delay scheduler")?,
    );
    let publisher = Arc::new(
        RabbitMqEventPublisher::connect(&config.rabbitmq_url)
            .await
            .context("connecting event publisher")?,
    );

    let coordinator = Arc::new(ReservationCoordinator::new(gateway, scheduler, publisher, &config));

    info!("starting expiration consumer...");
    let consumer = ExpirationConsumer::connect(
        &config.rabbitmq_url,
        coordinator.clone(),
        config.expiration_batch_size,
        config.expiration_flush_interval,
    )
    .await
    .context("starting expiration consumer")?;

    tokio::spawn(async move {
        if let Err(err) = consumer.run().await {
            tracing::error!(error = %err, "expiration consumer exited");
        }
    });

    let state = AppState::new(pool, coordinator);
    let app = Router::new().route("/health", get(health_check_simple)).with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .context("binding listener")?;
    info!("API Gateway running on http://0.0.0.0:3000");
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
