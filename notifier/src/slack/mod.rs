//! Slack notification channel

pub mod client;
pub mod models;
