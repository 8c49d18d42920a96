//! Render-and-send cycle shared by the event and timer triggers

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::deploy::tracker::DeploymentTracker;
use crate::errors::NotifierError;
use crate::slack::client::NotificationChannel;
use crate::slack::models::MessageHandle;

/// What a broadcast did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// No projects yet, nothing was sent
    Skipped,

    /// First message posted
    Published(MessageHandle),

    /// Existing message rewritten
    Updated(MessageHandle),
}

/// Publishes the tracker's state to the notification channel.
///
/// Sends are serialized so only the first broadcast ever publishes; the
/// tracker lock is held only while rendering, never across the network call.
pub struct Broadcaster {
    tracker: Arc<DeploymentTracker>,
    channel: Arc<dyn NotificationChannel>,
    header: String,
    send_lock: Mutex<()>,
}

impl Broadcaster {
    /// Create a new broadcaster
    pub fn new(
        tracker: Arc<DeploymentTracker>,
        channel: Arc<dyn NotificationChannel>,
        header: String,
    ) -> Self {
        Self {
            tracker,
            channel,
            header,
            send_lock: Mutex::new(()),
        }
    }

    pub fn tracker(&self) -> &Arc<DeploymentTracker> {
        &self.tracker
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Render the current state and publish or update the channel message
    pub async fn broadcast(&self) -> Result<BroadcastOutcome, NotifierError> {
        let _send_guard = self.send_lock.lock().await;

        let snapshot = self.tracker.snapshot();
        if snapshot.report.is_empty() {
            return Ok(BroadcastOutcome::Skipped);
        }

        let attachments = &snapshot.report.attachments;
        match snapshot.message_handle {
            None => {
                let handle = self.channel.publish(&self.header, attachments).await?;
                self.tracker.set_message_handle(handle.clone());
                debug!("Published status message {}", handle);
                Ok(BroadcastOutcome::Published(handle))
            }
            Some(handle) => {
                self.channel.update(&handle, &self.header, attachments).await?;
                debug!("Updated status message {}", handle);
                Ok(BroadcastOutcome::Updated(handle))
            }
        }
    }

    /// Broadcast, logging failures instead of returning them.
    ///
    /// The next broadcast re-renders from current state, so a failed send is
    /// retried implicitly.
    pub async fn broadcast_or_log(&self, trigger: &str) {
        if let Err(e) = self.broadcast().await {
            error!("Broadcast ({}) failed: {}", trigger, e);
        }
    }
}
