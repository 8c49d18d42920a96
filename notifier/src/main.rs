//! Deploy Notifier - Entry Point
//!
//! Listens for stage pings from a CI pipeline and mirrors the overall
//! deployment progress into one Slack message.

use std::env;
use std::sync::Arc;

use deploy_notifier::app::options::AppOptions;
use deploy_notifier::app::run::run;
use deploy_notifier::logs::{init_logging, LogOptions};
use deploy_notifier::settings::Settings;
use deploy_notifier::slack::client::SlackClient;
use deploy_notifier::utils::version_info;

use secrecy::ExposeSecret;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Print version and exit
    let version = version_info();
    if env::args().skip(1).any(|arg| arg == "--version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(_) => println!("{}", version.version),
        }
        return;
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to load settings: {e}");
            std::process::exit(1);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level,
        json_format: settings.json_logs,
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    if settings.slack.token.expose_secret().is_empty() {
        warn!("SLACK_TOKEN is not set, status messages will be rejected");
    }
    if settings.slack.channel_id.is_empty() {
        warn!("CHANNEL_ID is not set, status messages will be rejected");
    }

    let options = AppOptions::from_settings(&settings);

    let slack = match SlackClient::from_settings(settings.slack) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create Slack client: {e}");
            std::process::exit(1);
        }
    };

    info!(
        version = %version.version,
        git_hash = %version.git_hash,
        "Running deploy notifier with options: {:?}",
        options
    );

    if let Err(e) = run(options, Arc::new(slack), await_shutdown_signal()).await {
        error!("Deploy notifier failed: {e}");
        std::process::exit(1);
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Unable to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
        }
        info!("Ctrl+C received, shutting down...");
    }
}
