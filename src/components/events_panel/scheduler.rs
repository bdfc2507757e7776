use super::handle::EventsPanelHandle;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Start refreshing the events panel every `every` until `cancel` fires.
///
/// The first refresh happens one full interval after the call; the initial
/// load is done by the session itself.
pub fn start_poller(
    handle: EventsPanelHandle,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        info!("Events poller started, refreshing every {:?}", every);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Events poller stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let outcome = handle.refresh().await;
                    debug!("Polled events: {:?}", outcome);
                }
            }
        }
    })
}
