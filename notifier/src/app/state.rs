//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::broadcast::broadcaster::Broadcaster;
use crate::deploy::ids::IdAllocator;
use crate::deploy::tracker::DeploymentTracker;
use crate::slack::client::NotificationChannel;

/// Main application state, built once at startup and shared by reference
pub struct AppState {
    /// Deployment aggregate
    pub tracker: Arc<DeploymentTracker>,

    /// Publishes the aggregate to the channel
    pub broadcaster: Arc<Broadcaster>,
}

impl AppState {
    /// Initialize application state; the deployment clock starts here
    pub fn init(channel: Arc<dyn NotificationChannel>, message_header: String) -> Self {
        info!("Initializing application state...");

        let ids = Arc::new(IdAllocator::new());
        let tracker = Arc::new(DeploymentTracker::new(ids));
        let broadcaster = Arc::new(Broadcaster::new(tracker.clone(), channel, message_header));

        Self {
            tracker,
            broadcaster,
        }
    }
}
