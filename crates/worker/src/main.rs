use std::sync::Arc;

use plantops_events::{EventBus, EventPersistence};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plantops_worker=debug,plantops_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::error!("DATABASE_URL is not set");
            std::process::exit(1);
        }
    };

    let pool = match plantops_db::create_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };
    if let Err(e) = plantops_db::health_check(&pool).await {
        tracing::error!(error = %e, "Database health check failed");
        std::process::exit(1);
    }

    let bus = Arc::new(EventBus::default());
    let cancel = CancellationToken::new();

    // Audit sink: persist every published event.
    let persistence = tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));

    let scan = tokio::spawn(plantops_worker::scan::run(
        pool.clone(),
        Arc::clone(&bus),
        plantops_worker::scan::scan_interval_from_env(),
        cancel.clone(),
    ));

    tracing::info!("Worker started");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
    cancel.cancel();

    let _ = scan.await;
    // Dropping the bus closes the broadcast channel; persistence drains and exits.
    drop(bus);
    let _ = persistence.await;

    tracing::info!("Worker stopped");
}
