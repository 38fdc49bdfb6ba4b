//! Orchestration service contract

pub mod client;
pub mod models;
pub mod status;
pub mod template;
