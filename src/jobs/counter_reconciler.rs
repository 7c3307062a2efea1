use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::infra::store::InteractionStore;

/// Periodically rewrites article counters from the interaction rows, catching
/// any drift the per-toggle updates let through.
pub async fn run(store: Arc<dyn InteractionStore>, interval: Duration) -> Result<()> {
    info!(interval_seconds = interval.as_secs(), "counter reconciler started");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        run_once(store.as_ref()).await;
    }
}

pub async fn run_once(store: &dyn InteractionStore) -> Option<u64> {
    match store.reconcile_counters().await {
        Ok(0) => {
            info!("counters consistent");
            Some(0)
        }
        Ok(fixed) => {
            warn!(articles = fixed, "repaired drifted article counters");
            Some(fixed)
        }
        Err(err) => {
            error!(error = ?err, "counter reconciliation failed");
            None
        }
    }
}
