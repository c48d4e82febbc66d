//! Core of agentflow: agent graphs, validation, level planning and memoized
//! parallel execution.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod graph;
pub mod orchestrator;
pub mod playbook;
