//! Slack Web API models

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deploy::render::Attachment;

/// Handle of a posted message; Slack identifies messages by channel + `ts`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHandle(String);

impl MessageHandle {
    pub fn new(ts: impl Into<String>) -> Self {
        Self(ts.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `chat.postMessage` request body
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest<'a> {
    pub channel: &'a str,
    pub text: &'a str,
    pub attachments: &'a [Attachment],
}

/// `chat.update` request body
#[derive(Debug, Clone, Serialize)]
pub struct UpdateMessageRequest<'a> {
    pub channel: &'a str,
    pub ts: &'a str,
    pub text: &'a str,
    pub attachments: &'a [Attachment],
}

/// Common shape of `chat.*` responses
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub ok: bool,

    #[serde(default)]
    pub ts: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}
