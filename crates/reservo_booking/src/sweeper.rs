// --- File: crates/reservo_booking/src/sweeper.rs ---
use crate::service::BookingService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Periodically drops expired holds so their slots show up as available
/// and subscribers are told about it.
pub fn spawn_hold_sweeper(service: Arc<BookingService>, every: Duration) -> JoinHandle<()> {
    let every = every.max(Duration::from_millis(100));
    info!("hold sweeper started, every {:?}", every);

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let swept = service.sweep_expired_holds();
            if swept > 0 {
                debug!("hold sweeper released {} slots", swept);
            }
        }
    })
}
