//! Periodic flush monitor.

use std::sync::Arc;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::Shared;

/// Flushes the queue when traffic is too sparse to reach a batch threshold.
///
/// Wakes every `batch_time`; if at least that long has passed since the last
/// flush and records are waiting, flushes one batch inline. Returns as soon as
/// `liveness` is cancelled; a flush already started is allowed to finish.
pub(super) async fn run_monitor<M: Send + 'static>(
    shared: Arc<Shared<M>>,
    liveness: CancellationToken,
) {
    let period = shared.config.batch_time;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log::debug!("Flush monitor started ({:?} interval)", period);
    loop {
        tokio::select! {
            _ = liveness.cancelled() => break,
            _ = ticker.tick() => {
                if shared.flush_due() {
                    log::info!("Queue flush: time without flush exceeded");
                    if let Err(e) = shared.flush().await {
                        log::error!("Periodic flush failed: {}", e);
                    }
                }
            }
        }
    }
    log::debug!("Flush monitor stopped");
}
