//! Periodic broadcast worker

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info};

use crate::broadcast::broadcaster::Broadcaster;

/// Periodic broadcaster options
#[derive(Debug, Clone)]
pub struct Options {
    /// Re-broadcast interval, keeps elapsed times in the message ticking
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
        }
    }
}

/// Run the periodic broadcaster.
///
/// Stops for good once the deployment is marked done or the shutdown signal
/// fires, whichever comes first.
pub async fn run<S, F>(
    options: &Options,
    broadcaster: &Broadcaster,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Periodic broadcaster starting (every {:?})...", options.interval);

    let tracker = broadcaster.tracker();
    let mut done_rx = tracker.subscribe_done();

    loop {
        if tracker.is_done() {
            info!("Deployment done, periodic broadcaster stopping");
            return;
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Periodic broadcaster shutting down...");
                return;
            }
            _ = done_rx.changed() => {
                // done is re-checked at the top of the loop
                continue;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with broadcast
            }
        }

        if tracker.is_done() {
            continue;
        }

        debug!("Periodic broadcast tick");
        broadcaster.broadcast_or_log("periodic").await;
    }
}
