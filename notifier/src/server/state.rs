//! Server state

use std::sync::Arc;

use crate::broadcast::broadcaster::Broadcaster;
use crate::deploy::tracker::DeploymentTracker;

/// Server state shared across handlers
pub struct ServerState {
    pub tracker: Arc<DeploymentTracker>,
    pub broadcaster: Arc<Broadcaster>,
}

impl ServerState {
    pub fn new(tracker: Arc<DeploymentTracker>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            tracker,
            broadcaster,
        }
    }
}
