//! HTTP request handlers

use std::sync::Arc;

use axum::{extract::State, http::Uri, response::IntoResponse, Json};
use serde::Serialize;

use crate::deploy::render::Attachment;
use crate::deploy::tracker::ProjectEvent;
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Acknowledgement returned to every pipeline ping
pub const ACK: &str = "ok";

/// Record the event, then push the new state out. The ack does not depend on
/// whether the broadcast went through.
async fn record_and_broadcast(state: &ServerState, project: &str, event: ProjectEvent) -> &'static str {
    state.tracker.record(project, event);
    state.broadcaster.broadcast_or_log("event").await;
    ACK
}

/// Project name from the last path segment, percent-decoded.
///
/// Bytes that do not form valid UTF-8 after decoding become U+FFFD, so every
/// matched ping is still recorded and acknowledged.
pub fn project_name(uri: &Uri) -> String {
    let segment = uri.path().rsplit('/').next().unwrap_or_default();
    String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes())).into_owned()
}

/// `GET /building/{project}`
pub async fn building_handler(State(state): State<Arc<ServerState>>, uri: Uri) -> &'static str {
    let project = project_name(&uri);
    record_and_broadcast(&state, &project, ProjectEvent::Building).await
}

/// `GET /deploying/{project}`
pub async fn deploying_handler(State(state): State<Arc<ServerState>>, uri: Uri) -> &'static str {
    let project = project_name(&uri);
    record_and_broadcast(&state, &project, ProjectEvent::Deploying).await
}

/// `GET /failed/{project}`
pub async fn failed_handler(State(state): State<Arc<ServerState>>, uri: Uri) -> &'static str {
    let project = project_name(&uri);
    record_and_broadcast(&state, &project, ProjectEvent::Failed).await
}

/// `GET /succeeded/{project}`
pub async fn succeeded_handler(State(state): State<Arc<ServerState>>, uri: Uri) -> &'static str {
    let project = project_name(&uri);
    record_and_broadcast(&state, &project, ProjectEvent::Succeeded).await
}

/// `GET /noop/{project}`
pub async fn noop_handler(State(state): State<Arc<ServerState>>, uri: Uri) -> &'static str {
    let project = project_name(&uri);
    record_and_broadcast(&state, &project, ProjectEvent::NotDeploying).await
}

/// `GET /done`
pub async fn done_handler(State(state): State<Arc<ServerState>>) -> &'static str {
    state.tracker.mark_done();
    state.broadcaster.broadcast_or_log("done").await;
    ACK
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "deploy-notifier".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Current rendering of the deployment, as it would be sent to Slack
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub header: String,
    pub done: bool,
    pub projects: usize,
    pub attachments: Vec<Attachment>,
}

/// Status handler
pub async fn status_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let snapshot = state.tracker.snapshot();
    Json(StatusResponse {
        header: state.broadcaster.header().to_string(),
        done: snapshot.report.done,
        projects: snapshot.projects,
        attachments: snapshot.report.attachments,
    })
}
