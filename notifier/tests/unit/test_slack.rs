//! Slack client tests against a local stand-in for the Web API

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use deploy_notifier::deploy::render::Attachment;
use deploy_notifier::errors::NotifierError;
use deploy_notifier::settings::Settings;
use deploy_notifier::slack::client::{NotificationChannel, SlackClient};
use deploy_notifier::slack::models::MessageHandle;
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_test::assert_ok;

#[derive(Default)]
struct FakeSlack {
    requests: Mutex<Vec<(String, Option<String>, Value)>>,
    reject_with: Option<&'static str>,
}

impl FakeSlack {
    fn record(&self, method: &str, headers: &HeaderMap, body: Value) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), auth, body));

        match self.reject_with {
            Some(error) => Json(json!({"ok": false, "error": error})),
            None => Json(json!({"ok": true, "channel": "C123", "ts": "1700000000.000100"})),
        }
    }
}

/// Serve the fake API on an ephemeral port and return its base URL
async fn start(fake: Arc<FakeSlack>) -> String {
    let app = Router::new()
        .route(
            "/chat.postMessage",
            post(
                |State(fake): State<Arc<FakeSlack>>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    fake.record("chat.postMessage", &headers, body)
                },
            ),
        )
        .route(
            "/chat.update",
            post(
                |State(fake): State<Arc<FakeSlack>>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    fake.record("chat.update", &headers, body)
                },
            ),
        )
        .with_state(fake);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/", addr)
}

fn client(base_url: &str) -> SlackClient {
    SlackClient::new(base_url, SecretString::from("xoxb-test".to_string()), "C123".to_string()).unwrap()
}

fn attachments() -> Vec<Attachment> {
    vec![Attachment {
        color: "#ffa500".to_string(),
        text: "Api building (00:12)".to_string(),
        id: 0,
    }]
}

#[tokio::test]
async fn test_publish_posts_message() {
    let fake = Arc::new(FakeSlack::default());
    let client = client(&start(fake.clone()).await);
    assert!(!client.base_url().ends_with('/'));

    let handle = assert_ok!(client.publish("Deploying main", &attachments()).await);
    assert_eq!(handle, MessageHandle::new("1700000000.000100"));

    let requests = fake.requests.lock().unwrap();
    let (method, auth, body) = &requests[0];
    assert_eq!(method, "chat.postMessage");
    assert_eq!(auth.as_deref(), Some("Bearer xoxb-test"));
    assert_eq!(
        body,
        &json!({
            "channel": "C123",
            "text": "Deploying main",
            "attachments": [{"color": "#ffa500", "text": "Api building (00:12)", "id": 0}],
        })
    );
}

#[tokio::test]
async fn test_update_targets_handle() {
    let fake = Arc::new(FakeSlack::default());
    let client = client(&start(fake.clone()).await);

    client
        .update(&MessageHandle::new("1700000000.000100"), "Deploying main", &attachments())
        .await
        .unwrap();

    let requests = fake.requests.lock().unwrap();
    let (method, _, body) = &requests[0];
    assert_eq!(method, "chat.update");
    assert_eq!(body["ts"], "1700000000.000100");
    assert_eq!(body["channel"], "C123");
}

#[tokio::test]
async fn test_rejection_is_an_error() {
    let fake = Arc::new(FakeSlack {
        reject_with: Some("invalid_auth"),
        ..Default::default()
    });
    let client = client(&start(fake).await);

    match client.publish("Deploying main", &attachments()).await {
        Err(NotifierError::SlackError(message)) => assert!(message.contains("invalid_auth")),
        other => panic!("expected a Slack error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_api_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&format!("http://{}", addr));
    assert!(matches!(
        client.publish("Deploying main", &attachments()).await,
        Err(NotifierError::HttpError(_))
    ));
}

#[tokio::test]
async fn test_client_from_settings_uses_configured_token() {
    let fake = Arc::new(FakeSlack::default());
    let base_url = start(fake.clone()).await;

    let settings = Settings::from_lookup(|key| match key {
        "SLACK_API_URL" => Some(base_url.clone()),
        "SLACK_TOKEN" => Some("xoxb-from-env".to_string()),
        "CHANNEL_ID" => Some("C999".to_string()),
        _ => None,
    })
    .unwrap();

    let client = SlackClient::from_settings(settings.slack).unwrap();
    assert_ok!(client.publish("Deploying", &attachments()).await);

    let requests = fake.requests.lock().unwrap();
    assert_eq!(requests[0].1.as_deref(), Some("Bearer xoxb-from-env"));
    assert_eq!(requests[0].2["channel"], "C999");
}
