//! Deployment tracker tests

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use deploy_notifier::deploy::ids::IdAllocator;
use deploy_notifier::deploy::project::Stage;
use deploy_notifier::deploy::render::{FAILED_COLOR, SUCCEEDED_COLOR};
use deploy_notifier::deploy::tracker::{DeploymentTracker, ProjectEvent};

use crate::support::new_tracker;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn tracker_at_t0() -> DeploymentTracker {
    DeploymentTracker::started_at(Arc::new(IdAllocator::new()), t0())
}

#[test]
fn test_failed_deployment_scenario() {
    let tracker = tracker_at_t0();
    tracker.record_at("api", ProjectEvent::Building, t0());
    tracker.record_at("web", ProjectEvent::Building, t0() + Duration::seconds(1));
    tracker.record_at("api", ProjectEvent::Succeeded, t0() + Duration::seconds(95));
    tracker.record_at("web", ProjectEvent::Failed, t0() + Duration::seconds(100));
    tracker.mark_done();

    let report = tracker.render_at(t0() + Duration::seconds(125));
    let texts: Vec<&str> = report.attachments.iter().map(|a| a.text.as_str()).collect();

    assert_eq!(
        texts,
        vec![
            "Api succeeded (took 01:35)",
            "Web FAILED building (02:04)",
            "Failed (took 02:05)",
        ]
    );
    assert_eq!(report.attachments[0].id, 0);
    assert_eq!(report.attachments[1].id, 1);
    assert_eq!(report.attachments[1].color, FAILED_COLOR);
    assert_eq!(report.attachments[2].color, FAILED_COLOR);
    assert!(report.done);
}

#[test]
fn test_successful_deployment_scenario() {
    let tracker = tracker_at_t0();
    tracker.record_at("api", ProjectEvent::Building, t0());
    tracker.record_at("api", ProjectEvent::Deploying, t0() + Duration::seconds(30));
    tracker.record_at("api", ProjectEvent::Succeeded, t0() + Duration::seconds(60));
    tracker.record_at("docs", ProjectEvent::NotDeploying, t0());
    tracker.mark_done();

    let report = tracker.render_at(t0() + Duration::seconds(61));
    let summary = report.attachments.last().unwrap();
    assert_eq!(summary.text, "Succeeded (took 01:01)");
    assert_eq!(summary.color, SUCCEEDED_COLOR);
}

#[test]
fn test_mark_done_twice_renders_one_summary() {
    let tracker = tracker_at_t0();
    tracker.record_at("api", ProjectEvent::Succeeded, t0());
    tracker.mark_done();
    tracker.mark_done();

    let report = tracker.render_at(t0());
    assert_eq!(report.attachments.len(), 2);
}

#[test]
fn test_failed_flag_survives_later_events() {
    let tracker = tracker_at_t0();
    tracker.record_at("api", ProjectEvent::Failed, t0());
    for event in [
        ProjectEvent::NotDeploying,
        ProjectEvent::Building,
        ProjectEvent::Deploying,
        ProjectEvent::Succeeded,
    ] {
        tracker.record_at("api", event, t0());
        assert!(tracker.project("api").unwrap().is_failed());
    }
    assert_eq!(tracker.project("api").unwrap().stage(), Some(Stage::Succeeded));
}

#[test]
fn test_empty_tracker_renders_nothing() {
    let tracker = tracker_at_t0();
    tracker.mark_done();
    assert!(tracker.render_at(t0()).is_empty());
}

#[test]
fn test_repeat_events_do_not_duplicate_projects() {
    let tracker = tracker_at_t0();
    let names = ["api", "web", "api", "worker", "web", "api"];
    for (i, name) in names.iter().enumerate() {
        tracker.record_at(name, ProjectEvent::Building, t0() + Duration::seconds(i as i64));
    }

    let projects = tracker.projects();
    let listed: Vec<(&str, u64)> = projects.iter().map(|p| (p.name(), p.id())).collect();
    assert_eq!(listed, vec![("api", 0), ("web", 1), ("worker", 2)]);
    assert_eq!(tracker.project("web").unwrap().start_time(), t0() + Duration::seconds(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_new_projects_get_distinct_ids() {
    const PROJECTS: usize = 200;
    let tracker = new_tracker();

    let tasks = (0..PROJECTS).map(|i| {
        let tracker = tracker.clone();
        tokio::spawn(async move {
            tracker.start_building(&format!("project-{i}"));
            tracker.start_deploying(&format!("project-{i}"));
        })
    });
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    let projects = tracker.projects();
    assert_eq!(projects.len(), PROJECTS);

    let ids: Vec<u64> = projects.iter().map(|p| p.id()).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    let names: HashSet<&str> = projects.iter().map(|p| p.name()).collect();
    assert_eq!(names.len(), PROJECTS);
}
