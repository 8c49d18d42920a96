//! Application configuration options

use std::time::Duration;

use crate::settings::Settings;
use crate::workers::broadcaster;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Periodic broadcaster options
    pub broadcaster: broadcaster::Options,

    /// Header text of the status message
    pub message_header: String,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions::default(),
            broadcaster: broadcaster::Options::default(),
            message_header: String::new(),
        }
    }
}

impl AppOptions {
    /// Build options from loaded settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            server: ServerOptions {
                host: settings.host.clone(),
                port: settings.port,
            },
            broadcaster: broadcaster::Options {
                interval: Duration::from_secs(settings.broadcast_interval_secs),
            },
            message_header: settings.message_header(),
            ..Default::default()
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP listener options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8085,
        }
    }
}
