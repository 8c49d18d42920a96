//! Deploy Notifier Library
//!
//! Collects per-project stage pings from CI and keeps a single Slack
//! message in sync with the overall deployment.

pub mod app;
pub mod broadcast;
pub mod deploy;
pub mod errors;
pub mod logs;
pub mod server;
pub mod settings;
pub mod slack;
pub mod utils;
pub mod workers;
