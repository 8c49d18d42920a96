//! Startup settings read from the environment

use secrecy::SecretString;

use crate::errors::NotifierError;
use crate::logs::LogLevel;

const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8085;
const DEFAULT_BROADCAST_INTERVAL_SECS: u64 = 15;

/// Notifier settings, immutable once loaded
#[derive(Debug)]
pub struct Settings {
    /// Log level
    pub log_level: LogLevel,

    /// Emit JSON logs
    pub json_logs: bool,

    /// Slack configuration
    pub slack: SlackSettings,

    /// CI run metadata shown in the message header
    pub run: RunInfo,

    /// Host to bind the HTTP listener to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Periodic broadcast interval in seconds
    pub broadcast_interval_secs: u64,
}

/// Slack settings
#[derive(Debug)]
pub struct SlackSettings {
    /// Web API base URL
    pub api_url: String,

    /// Bot token
    pub token: SecretString,

    /// Channel the status message is posted to
    pub channel_id: String,

    /// Free-form header text
    pub header: String,
}

/// Informational CI run fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunInfo {
    pub run_id: Option<String>,
    pub tenant: Option<String>,
    pub repo_url: Option<String>,
}

impl Settings {
    /// Load settings from process environment variables
    pub fn from_env() -> Result<Self, NotifierError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<L>(lookup: L) -> Result<Self, NotifierError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let log_level = match get("LOG_LEVEL") {
            Some(level) => level.parse::<LogLevel>().map_err(NotifierError::ConfigError)?,
            None => LogLevel::default(),
        };

        let port = match get("NOTIFIER_PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|_| NotifierError::ConfigError(format!("Invalid NOTIFIER_PORT: {}", port)))?,
            None => DEFAULT_PORT,
        };

        let broadcast_interval_secs = match get("BROADCAST_INTERVAL_SECS") {
            Some(secs) => match secs.trim().parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(NotifierError::ConfigError(format!(
                        "Invalid BROADCAST_INTERVAL_SECS: {}",
                        secs
                    )))
                }
                Ok(secs) => secs,
            },
            None => DEFAULT_BROADCAST_INTERVAL_SECS,
        };

        Ok(Self {
            log_level,
            json_logs: get("LOG_FORMAT").is_some_and(|format| format.eq_ignore_ascii_case("json")),
            slack: SlackSettings {
                api_url: get("SLACK_API_URL").unwrap_or_else(|| DEFAULT_SLACK_API_URL.to_string()),
                token: SecretString::from(get("SLACK_TOKEN").unwrap_or_default()),
                channel_id: get("CHANNEL_ID").unwrap_or_default(),
                header: lookup("SLACK_HEADER").unwrap_or_default(),
            },
            run: RunInfo {
                run_id: get("RUN_ID"),
                tenant: get("TENANT"),
                repo_url: get("REPO_URL"),
            },
            host: get("NOTIFIER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            broadcast_interval_secs,
        })
    }

    /// Header text for the status message.
    ///
    /// `[tenant] header (run link)`, with each decoration present only when
    /// its field is set.
    pub fn message_header(&self) -> String {
        let mut header = String::new();
        if let Some(tenant) = &self.run.tenant {
            header.push_str(&format!("[{}] ", tenant));
        }
        header.push_str(&self.slack.header);

        match (&self.run.repo_url, &self.run.run_id) {
            (Some(repo_url), Some(run_id)) => header.push_str(&format!(
                " (<{}/actions/runs/{}|run {}>)",
                repo_url.trim_end_matches('/'),
                run_id,
                run_id
            )),
            (None, Some(run_id)) => header.push_str(&format!(" (run {})", run_id)),
            _ => {}
        }

        header.trim().to_string()
    }
}
