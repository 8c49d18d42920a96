//! Rendering of the aggregate into message attachments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deploy::project::{ProjectRecord, Stage};
use crate::utils::{format_duration, title_case};

pub const FAILED_COLOR: &str = "#ff4500";
pub const IN_PROGRESS_COLOR: &str = "#ffa500";
pub const SUCCEEDED_COLOR: &str = "#0b0";
pub const NEUTRAL_COLOR: &str = "#aaa";

/// One colored line of the status message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub color: String,
    pub text: String,
    pub id: u64,
}

/// Rendered view of the whole deployment, one attachment per project plus an
/// optional summary once the deployment is done
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub attachments: Vec<Attachment>,
    pub done: bool,
}

impl StatusReport {
    /// Nothing to show until the first project reports in
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

/// Render `projects` (already in id order) as of `now`.
pub fn render_report(
    projects: &[ProjectRecord],
    start_time: DateTime<Utc>,
    done: bool,
    now: DateTime<Utc>,
) -> StatusReport {
    if projects.is_empty() {
        return StatusReport {
            attachments: Vec::new(),
            done,
        };
    }

    let mut attachments: Vec<Attachment> = projects
        .iter()
        .map(|project| Attachment {
            color: project_color(project).to_string(),
            text: status_line(project, now),
            id: project.id(),
        })
        .collect();

    if done {
        let success = projects.iter().all(ProjectRecord::is_successful);
        let took = format_duration(now - start_time);
        let (color, text) = if success {
            (SUCCEEDED_COLOR, format!("Succeeded (took {})", took))
        } else {
            (FAILED_COLOR, format!("Failed (took {})", took))
        };
        // one past the highest project id, so it never shares an id with a project
        let id = projects.iter().map(ProjectRecord::id).max().unwrap_or(0) + 1;
        attachments.push(Attachment {
            color: color.to_string(),
            text,
            id,
        });
    }

    StatusReport { attachments, done }
}

/// Attachment color for a project. Failure overrides the stage color.
pub fn project_color(project: &ProjectRecord) -> &'static str {
    if project.is_failed() {
        return FAILED_COLOR;
    }
    match project.stage() {
        Some(Stage::NotDeploying) => NEUTRAL_COLOR,
        Some(Stage::Building | Stage::Deploying) => IN_PROGRESS_COLOR,
        Some(Stage::Succeeded) => SUCCEEDED_COLOR,
        None => "",
    }
}

/// Human-readable status line for a project
pub fn status_line(project: &ProjectRecord, now: DateTime<Utc>) -> String {
    let name = title_case(project.name());
    let status = match project.stage() {
        Some(Stage::NotDeploying) => " is not deploying (no changes)".to_string(),
        Some(stage @ (Stage::Building | Stage::Deploying)) => format!(
            " {} ({})",
            stage.verb(),
            format_duration(now - project.start_time())
        ),
        Some(Stage::Succeeded) => {
            let end = project.end_time().unwrap_or(now);
            format!(" succeeded (took {})", format_duration(end - project.start_time()))
        }
        None => String::new(),
    };

    if project.is_failed() {
        format!("{} FAILED{}", name, status)
    } else {
        format!("{}{}", name, status)
    }
}
