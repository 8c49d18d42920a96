//! Deployment state aggregation

pub mod ids;
pub mod project;
pub mod render;
pub mod tracker;
