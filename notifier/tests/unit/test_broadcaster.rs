//! Broadcaster tests

use std::sync::Arc;
use std::time::Duration;

use deploy_notifier::broadcast::broadcaster::BroadcastOutcome;
use deploy_notifier::slack::models::MessageHandle;
use tokio_test::assert_ok;

use crate::support::{new_broadcaster, Call, RecordingChannel};

#[tokio::test]
async fn test_no_projects_no_calls() {
    let channel = Arc::new(RecordingChannel::new());
    let (tracker, broadcaster) = new_broadcaster(channel.clone());

    assert_eq!(broadcaster.broadcast().await.unwrap(), BroadcastOutcome::Skipped);

    tracker.mark_done();
    assert_eq!(broadcaster.broadcast().await.unwrap(), BroadcastOutcome::Skipped);
    assert!(channel.calls().is_empty());
    assert!(tracker.message_handle().is_none());
}

#[tokio::test]
async fn test_publish_once_then_update() {
    let channel = Arc::new(RecordingChannel::new());
    let (tracker, broadcaster) = new_broadcaster(channel.clone());

    tracker.start_building("api");
    let first = broadcaster.broadcast().await.unwrap();
    let handle = MessageHandle::new("1700000000.000000");
    assert_eq!(first, BroadcastOutcome::Published(handle.clone()));
    assert_eq!(tracker.message_handle(), Some(handle.clone()));

    tracker.succeeded("api");
    assert_eq!(
        broadcaster.broadcast().await.unwrap(),
        BroadcastOutcome::Updated(handle.clone())
    );
    tracker.mark_done();
    assert_eq!(
        broadcaster.broadcast().await.unwrap(),
        BroadcastOutcome::Updated(handle.clone())
    );

    assert_eq!(channel.publish_count(), 1);
    assert_eq!(channel.update_count(), 2);

    match channel.calls().last().unwrap() {
        Call::Update {
            handle: used,
            text,
            attachments,
        } => {
            assert_eq!(used, &handle);
            assert_eq!(text, "Deploying main");
            assert_eq!(attachments.len(), 2);
            assert!(attachments[0].text.starts_with("Api succeeded (took "));
            assert!(attachments[1].text.starts_with("Succeeded (took "));
        }
        other => panic!("expected an update, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_publish_is_retried_by_next_broadcast() {
    let channel = Arc::new(RecordingChannel::new());
    let (tracker, broadcaster) = new_broadcaster(channel.clone());

    tracker.start_building("api");
    channel.set_failing(true);
    assert!(broadcaster.broadcast().await.is_err());
    assert!(tracker.message_handle().is_none());

    // state keeps moving while the channel is down
    tracker.start_deploying("api");
    broadcaster.broadcast_or_log("test").await;

    channel.set_failing(false);
    let outcome = broadcaster.broadcast().await.unwrap();
    assert!(matches!(outcome, BroadcastOutcome::Published(_)));

    match &channel.calls()[0] {
        Call::Publish { attachments, .. } => {
            assert!(attachments[0].text.starts_with("Api deploying ("));
        }
        other => panic!("expected a publish, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_update_keeps_handle() {
    let channel = Arc::new(RecordingChannel::new());
    let (tracker, broadcaster) = new_broadcaster(channel.clone());

    tracker.start_building("api");
    broadcaster.broadcast().await.unwrap();
    let handle = tracker.message_handle().unwrap();

    channel.set_failing(true);
    assert!(broadcaster.broadcast().await.is_err());
    channel.set_failing(false);

    assert_eq!(
        broadcaster.broadcast().await.unwrap(),
        BroadcastOutcome::Updated(handle)
    );
    assert_eq!(channel.publish_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_broadcasts_publish_exactly_once() {
    let channel = Arc::new(RecordingChannel::with_latency(Duration::from_millis(5)));
    let (tracker, broadcaster) = new_broadcaster(channel.clone());
    tracker.start_building("api");

    let tasks = (0..10).map(|_| {
        let broadcaster = broadcaster.clone();
        tokio::spawn(async move { broadcaster.broadcast().await })
    });
    for result in futures::future::join_all(tasks).await {
        assert_ok!(result.unwrap());
    }

    assert_eq!(channel.publish_count(), 1);
    assert_eq!(channel.update_count(), 9);
}
