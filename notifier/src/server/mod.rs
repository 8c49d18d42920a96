//! HTTP adapter

pub mod handlers;
pub mod serve;
pub mod state;
