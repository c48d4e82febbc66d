use thiserror::Error;

/// Failure of a single agent invocation.
///
/// These never abort the engine: they become `error` entries in the execution log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("{0}")]
    Failed(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("executor panicked: {0}")]
    Panicked(String),
}

impl AgentError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Failed(format!("invalid json: {err}"))
    }
}
