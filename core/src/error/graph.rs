use thiserror::Error;

use super::codes::ErrorCode;

/// Errors raised while building or validating an agent graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate agent id: {0}")]
    DuplicateAgent(String),

    #[error("unknown agent '{missing}' referenced by '{referenced_by}'")]
    UnknownNode {
        missing: String,
        referenced_by: String,
    },

    #[error("agent '{0}' depends on itself")]
    SelfDependency(String),

    #[error("circular dependency detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },
}

impl ValidationError {
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::ValidationError
    }
}
