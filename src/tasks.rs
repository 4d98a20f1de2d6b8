use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::store::RevocationLedger;

/// Periodically drops ledger entries for tokens that have expired anyway.
///
/// The first pass runs immediately. The task runs until aborted.
pub fn spawn_revocation_pruner(ledger: Arc<dyn RevocationLedger>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match ledger.prune_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(pruned) => tracing::info!(pruned, "pruned expired revocation entries"),
                Err(e) => tracing::warn!(error = %e, "revocation pruning failed"),
            }
        }
    })
}
