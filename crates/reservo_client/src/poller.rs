use crate::api::SlotApi;
use crate::negotiator::HoldNegotiator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

/// Refreshes an open picker on a fixed interval until stopped or dropped.
pub struct SlotPoller {
    handle: JoinHandle<()>,
}

impl SlotPoller {
    pub fn start<A: SlotApi + 'static>(negotiator: Arc<HoldNegotiator<A>>, every: Duration) -> Self {
        let every = every.max(Duration::from_millis(100));
        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the immediate first tick; the picker fetched on open.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if negotiator.snapshot().date.is_none() {
                    continue;
                }
                if let Err(e) = negotiator.refresh().await {
                    debug!("slot poll failed: {}", e);
                }
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for SlotPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
