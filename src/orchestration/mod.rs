//! Publish workflow orchestration

pub mod orchestrator;

pub use orchestrator::Orchestrator;
