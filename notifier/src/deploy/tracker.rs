//! Deployment-wide aggregate of project records

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::info;

use crate::deploy::ids::IdAllocator;
use crate::deploy::project::{ProjectRecord, Stage};
use crate::deploy::render::{render_report, StatusReport};
use crate::slack::models::MessageHandle;

/// Stage event reported by a pipeline step for one project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectEvent {
    NotDeploying,
    Building,
    Deploying,
    Failed,
    Succeeded,
}

/// Consistent view of the aggregate taken under a single lock acquisition
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub report: StatusReport,
    pub message_handle: Option<MessageHandle>,
    pub projects: usize,
}

struct TrackerInner {
    projects: Vec<ProjectRecord>,
    index: HashMap<String, usize>,
    start_time: DateTime<Utc>,
    done: bool,
    message_handle: Option<MessageHandle>,
}

/// Tracks every project seen during one deployment run.
///
/// All state sits behind one mutex. Projects are appended on first sight and
/// never removed, so the vector is always in id order.
pub struct DeploymentTracker {
    ids: Arc<IdAllocator>,
    inner: Mutex<TrackerInner>,
    done_tx: watch::Sender<bool>,
}

impl DeploymentTracker {
    /// Create a tracker whose deployment starts now
    pub fn new(ids: Arc<IdAllocator>) -> Self {
        Self::started_at(ids, Utc::now())
    }

    /// Create a tracker with an explicit deployment start time
    pub fn started_at(ids: Arc<IdAllocator>, start_time: DateTime<Utc>) -> Self {
        let (done_tx, _) = watch::channel(false);
        Self {
            ids,
            inner: Mutex::new(TrackerInner {
                projects: Vec::new(),
                index: HashMap::new(),
                start_time,
                done: false,
                message_handle: None,
            }),
            done_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply an event to the named project, creating it on first sight
    pub fn record(&self, name: &str, event: ProjectEvent) {
        self.record_at(name, event, Utc::now());
    }

    /// Apply an event with an explicit timestamp
    pub fn record_at(&self, name: &str, event: ProjectEvent, now: DateTime<Utc>) {
        let mut inner = self.lock();
        let project = get_or_create(&mut inner, &self.ids, name, now);

        match event {
            ProjectEvent::NotDeploying => project.set_stage(Stage::NotDeploying),
            ProjectEvent::Building => project.set_stage(Stage::Building),
            ProjectEvent::Deploying => project.set_stage(Stage::Deploying),
            ProjectEvent::Failed => project.fail(now),
            ProjectEvent::Succeeded => project.succeed(now),
        }

        info!(project = name, id = project.id(), ?event, "Recorded project event");
    }

    pub fn not_deploying(&self, name: &str) {
        self.record(name, ProjectEvent::NotDeploying);
    }

    pub fn start_building(&self, name: &str) {
        self.record(name, ProjectEvent::Building);
    }

    pub fn start_deploying(&self, name: &str) {
        self.record(name, ProjectEvent::Deploying);
    }

    pub fn failed(&self, name: &str) {
        self.record(name, ProjectEvent::Failed);
    }

    pub fn succeeded(&self, name: &str) {
        self.record(name, ProjectEvent::Succeeded);
    }

    /// Mark the whole deployment finished.
    ///
    /// Returns true only for the call that flipped the flag.
    pub fn mark_done(&self) -> bool {
        let newly_done = {
            let mut inner = self.lock();
            !std::mem::replace(&mut inner.done, true)
        };

        if newly_done {
            info!("Deployment marked done");
            self.done_tx.send_replace(true);
        }
        newly_done
    }

    pub fn is_done(&self) -> bool {
        self.lock().done
    }

    /// Receiver that flips to `true` once the deployment is done
    pub fn subscribe_done(&self) -> watch::Receiver<bool> {
        self.done_tx.subscribe()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.lock().start_time
    }

    /// Copy of the named project, if it has been seen
    pub fn project(&self, name: &str) -> Option<ProjectRecord> {
        let inner = self.lock();
        inner.index.get(name).map(|&i| inner.projects[i].clone())
    }

    /// Copies of all projects in display order
    pub fn projects(&self) -> Vec<ProjectRecord> {
        self.lock().projects.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn message_handle(&self) -> Option<MessageHandle> {
        self.lock().message_handle.clone()
    }

    /// Store the handle of the published message.
    ///
    /// The first handle wins; returns false if one was already stored.
    pub fn set_message_handle(&self, handle: MessageHandle) -> bool {
        let mut inner = self.lock();
        if inner.message_handle.is_some() {
            return false;
        }
        inner.message_handle = Some(handle);
        true
    }

    /// Render the current state
    pub fn render(&self) -> StatusReport {
        self.snapshot().report
    }

    /// Render the current state as of `now`
    pub fn render_at(&self, now: DateTime<Utc>) -> StatusReport {
        self.snapshot_at(now).report
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_at(Utc::now())
    }

    /// Render and read the message handle under one lock acquisition
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Snapshot {
        let inner = self.lock();
        Snapshot {
            report: render_report(&inner.projects, inner.start_time, inner.done, now),
            message_handle: inner.message_handle.clone(),
            projects: inner.projects.len(),
        }
    }
}

fn get_or_create<'a>(
    inner: &'a mut TrackerInner,
    ids: &IdAllocator,
    name: &str,
    now: DateTime<Utc>,
) -> &'a mut ProjectRecord {
    let i = match inner.index.get(name) {
        Some(&i) => i,
        None => {
            let record = ProjectRecord::new(name, ids.next_id(), now);
            inner.projects.push(record);
            let i = inner.projects.len() - 1;
            inner.index.insert(name.to_string(), i);
            i
        }
    };
    &mut inner.projects[i]
}
