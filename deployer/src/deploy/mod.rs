//! Change set deployment

pub mod builder;
pub mod describer;
pub mod group;
pub mod orchestrator;
pub mod reasons;
