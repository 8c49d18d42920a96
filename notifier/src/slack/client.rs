//! Slack client and the notification channel seam

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, error};

use crate::deploy::render::Attachment;
use crate::errors::NotifierError;
use crate::settings::SlackSettings;
use crate::slack::models::{ChatResponse, MessageHandle, PostMessageRequest, UpdateMessageRequest};

/// Where status messages go; a trait so the broadcaster can be tested without Slack
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Post a new message and return its handle
    async fn publish(
        &self,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<MessageHandle, NotifierError>;

    /// Replace the content of a previously posted message
    async fn update(
        &self,
        handle: &MessageHandle,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<(), NotifierError>;
}

/// Per-request timeout for Slack calls; must stay below the shutdown delay
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack Web API client bound to one channel
pub struct SlackClient {
    client: Client,
    base_url: String,
    token: SecretString,
    channel_id: String,
}

impl SlackClient {
    /// Create a new Slack client
    pub fn new(base_url: &str, token: SecretString, channel_id: String) -> Result<Self, NotifierError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            channel_id,
        })
    }

    /// Create a client from loaded settings, taking ownership of the token
    pub fn from_settings(settings: SlackSettings) -> Result<Self, NotifierError> {
        let SlackSettings {
            api_url,
            token,
            channel_id,
            ..
        } = settings;
        Self::new(&api_url, token, channel_id)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call a `chat.*` method and check Slack's `ok` flag
    async fn call<B: Serialize>(&self, method: &str, body: &B) -> Result<ChatResponse, NotifierError> {
        let url = format!("{}/{}", self.base_url, method);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Slack {} failed: {} - {}", method, status, body);
            return Err(NotifierError::SlackError(format!("{}: {}", status, body)));
        }

        let body: ChatResponse = response.json().await?;
        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown_error".to_string());
            return Err(NotifierError::SlackError(format!("{} rejected: {}", method, reason)));
        }

        Ok(body)
    }
}

#[async_trait]
impl NotificationChannel for SlackClient {
    async fn publish(
        &self,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<MessageHandle, NotifierError> {
        let body = PostMessageRequest {
            channel: &self.channel_id,
            text,
            attachments,
        };

        let response = self.call("chat.postMessage", &body).await?;
        response
            .ts
            .map(MessageHandle::new)
            .ok_or_else(|| NotifierError::SlackError("chat.postMessage returned no ts".to_string()))
    }

    async fn update(
        &self,
        handle: &MessageHandle,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<(), NotifierError> {
        let body = UpdateMessageRequest {
            channel: &self.channel_id,
            ts: handle.as_str(),
            text,
            attachments,
        };

        self.call("chat.update", &body).await?;
        Ok(())
    }
}
