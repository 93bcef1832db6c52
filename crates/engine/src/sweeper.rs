//! Interval driver for the deadline-expiry sweep.

use crate::engine::CommitmentEngine;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Runs `expire_overdue_pools` on a fixed interval.
///
/// The sweep itself is idempotent, so overlapping deployments of the
/// sweeper only cost redundant scans, never double transitions.
pub struct ExpirySweeper {
    engine: Arc<CommitmentEngine>,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl ExpirySweeper {
    pub fn new(engine: Arc<CommitmentEngine>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts the sweep loop; returns when `stop` is called.
    pub async fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!(interval_secs = self.interval.as_secs(), "Starting expiry sweeper");

        let mut ticker = tokio::time::interval(self.interval);
        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;

            match self.engine.expire_overdue_pools(Utc::now()).await {
                Ok(expired) => {
                    if expired > 0 {
                        info!(expired, "Expiry sweep complete");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Expiry sweep failed; will retry next tick");
                }
            }
        }

        info!("Expiry sweeper stopped");
    }

    /// Stops the sweep loop after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Checks if the sweeper is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
