use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::infra::db::gate::Gate;
use crate::infra::db::pool::Backend;

/// Ping the database on a fixed interval until `shutdown` fires.
///
/// A beat is skipped when every slot is leased: busy connections are
/// demonstrably alive, and the heartbeat must never queue behind requests.
pub(crate) fn spawn(
    backend: Backend,
    gate: Gate,
    initial_delay: Duration,
    interval: Duration,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(initial_delay) => {}
            _ = shutdown.cancelled() => return,
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => beat(&backend, &gate).await,
                _ = shutdown.cancelled() => {
                    debug!(keep_alive = "stopped");
                    return;
                }
            }
        }
    });
}

async fn beat(backend: &Backend, gate: &Gate) {
    let Some(_slot) = gate.try_enter() else {
        debug!(keep_alive = "skipped", reason = "pool_busy");
        return;
    };

    let result = match backend {
        Backend::MySql(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        Backend::Sqlite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
    };

    match result {
        Ok(()) => debug!(keep_alive = "ok"),
        Err(e) => warn!(keep_alive = "failed", error = %e),
    }
}
