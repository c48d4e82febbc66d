//! agentflow-cli library, modules exposed for unit tests

pub mod commands;
pub mod error;
pub mod render;
