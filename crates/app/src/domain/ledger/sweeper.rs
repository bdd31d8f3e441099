//! Periodic removal of expired ledger entries.

use std::{sync::Arc, time::Duration};

use jiff::Timestamp;
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{error, info};

use crate::domain::ledger::service::LedgerService;

/// Default time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone)]
pub struct LedgerSweeper {
    ledger: Arc<dyn LedgerService>,
    interval: Duration,
}

impl LedgerSweeper {
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerService>, interval: Duration) -> Self {
        Self { ledger, interval }
    }

    /// Sweep on every tick until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "ledger sweeper started");

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.ledger.purge_expired(Timestamp::now()).await {
                        error!(%error, "failed to purge expired ledger entries");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("ledger sweeper stopped");
    }
}
