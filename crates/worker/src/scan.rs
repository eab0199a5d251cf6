//! Periodic work order generation scan (PRD-08).
//!
//! Spawns a long-running loop that invokes the generation engine on a fixed
//! interval using `tokio::time::interval`. A failed pass is logged and
//! retried on the next tick; the engine never retries internally.

use std::sync::Arc;
use std::time::Duration;

use plantops_events::EventBus;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the generation scan runs by default.
const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Resolve the scan interval from `GENERATION_INTERVAL_SECS`.
pub fn scan_interval_from_env() -> Duration {
    std::env::var("GENERATION_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_SCAN_INTERVAL)
}

/// Run the generation scan loop.
///
/// Invokes `generate_due_work_orders` every `interval` until `cancel` is
/// triggered.
pub async fn run(pool: PgPool, bus: Arc<EventBus>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Work order generation scan started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Work order generation scan stopping");
                break;
            }
            _ = ticker.tick() => {
                match plantops_engine::generation::generate_due_work_orders(&pool, &bus).await {
                    Ok(created) => {
                        if created.is_empty() {
                            tracing::debug!("Generation scan: nothing due");
                        } else {
                            tracing::info!(
                                created = created.len(),
                                "Generation scan: work orders created"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Generation scan failed; will retry next interval");
                    }
                }
            }
        }
    }
}
