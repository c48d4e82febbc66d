use agentflow_core::api::{ErrorCode, OrchestratorError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    Input(String),
    #[error("command failed: {0}")]
    Command(String),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    // 0: job completed
    // 1: job failed (returned as a normal exit code, not as an error)
    // 11: config / input error
    // 12: validation error
    // 20: I/O error
    // 30: result sink error
    // 31: job cancelled (normal exit code)
    // 50: internal/system error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Input(_) => ErrorCode::ConfigError.as_u16() as i32,
            Self::Command(_) | Self::Io(_) => ErrorCode::IoError.as_u16() as i32,
            Self::Orchestrator(e) => e.error_code().as_u16() as i32,
        }
    }
}
