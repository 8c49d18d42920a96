//! Per-project deployment record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase reported for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing changed, the project is skipped this run
    NotDeploying,

    /// Build in progress
    Building,

    /// Deploy in progress
    Deploying,

    /// Deploy finished
    Succeeded,
}

impl Stage {
    /// Verb used in the status line for in-flight stages
    pub fn verb(&self) -> &'static str {
        match self {
            Stage::NotDeploying => "not deploying",
            Stage::Building => "building",
            Stage::Deploying => "deploying",
            Stage::Succeeded => "succeeded",
        }
    }
}

/// Current state of one named project.
///
/// `name`, `id` and `start_time` are fixed at creation. `failed` is sticky and
/// independent of `stage`: a project can be both building and failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    name: String,
    id: u64,
    stage: Option<Stage>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    failed: bool,
}

impl ProjectRecord {
    /// Create a record with no stage yet
    pub fn new(name: impl Into<String>, id: u64, start_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            id,
            stage: None,
            start_time,
            end_time: None,
            failed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = Some(stage);
    }

    /// Mark the project failed. The stage is left untouched.
    pub(crate) fn fail(&mut self, at: DateTime<Utc>) {
        self.failed = true;
        self.end_time = Some(at);
    }

    pub(crate) fn succeed(&mut self, at: DateTime<Utc>) {
        self.stage = Some(Stage::Succeeded);
        self.end_time = Some(at);
    }

    /// A project counts towards overall success when it finished cleanly or had
    /// nothing to deploy.
    pub fn is_successful(&self) -> bool {
        !self.failed && matches!(self.stage, Some(Stage::Succeeded | Stage::NotDeploying))
    }
}
