// Merit recovery scheduler
// Background task that periodically runs the recovery transition over
// every driver account in the registry
//
// Numan Thabit 2025 Nov

use crate::registry::Registry;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Run one recovery sweep at the current wall-clock time.
pub async fn run_recovery_once(registry: &Registry) -> usize {
    let entries = registry.run_recovery(Utc::now()).await;
    let recovered: u32 = entries.iter().map(|e| e.recovered).sum();
    info!(
        accounts = entries.len(),
        points = recovered,
        "merit recovery sweep complete"
    );
    entries.len()
}

/// Spawn the periodic recovery task. The first sweep happens one full
/// interval after start.
pub fn start_recovery_scheduler(registry: Arc<Registry>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately on the first tick
        ticker.tick().await;
        debug!(every_secs = every.as_secs(), "merit recovery scheduler started");
        loop {
            ticker.tick().await;
            run_recovery_once(&registry).await;
        }
    })
}
