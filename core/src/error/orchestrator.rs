use thiserror::Error;

use super::codes::ErrorCode;
use super::graph::ValidationError;
use crate::executor::types::JobResult;

/// Graph/playbook provider failures.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("playbook not found: {0}")]
    NotFound(String),

    #[error("failed to read playbook '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed playbook: {0}")]
    Malformed(String),

    #[error("unsupported playbook format: {0}")]
    UnsupportedFormat(String),

    /// The definition loaded but does not form a graph (e.g. duplicate ids).
    #[error(transparent)]
    Graph(#[from] ValidationError),
}

/// Problems detected before a job starts that are not graph-shape problems.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("no executor registered for routing key '{routing_key}' (agent '{agent_id}')")]
    UnknownRoutingKey {
        agent_id: String,
        routing_key: String,
    },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Unexpected internal faults. These abort the job immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SystemError {
    #[error("memoization cache lock poisoned")]
    CachePoisoned,

    #[error("agent '{0}' is in the plan but not in the graph")]
    PlanMismatch(String),

    #[error("dependency '{dependency}' of agent '{agent_id}' has no recorded output")]
    MissingDependencyOutput {
        agent_id: String,
        dependency: String,
    },

    #[error("concurrency limiter closed unexpectedly")]
    LimiterClosed,
}

/// Result sink failures.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to write '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize job result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink error: {0}")]
    Other(String),
}

/// Status publisher failure. Logged by the engine, never propagated.
#[derive(Error, Debug, Clone)]
#[error("publish failed: {0}")]
pub struct PublishError(pub String);

/// Top-level error returned by the orchestrator.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("system error: {0}")]
    System(#[from] SystemError),

    /// Execution finished but persisting it did not. The full result is kept.
    #[error("result sink failed for job '{job_id}': {source}")]
    Sink {
        job_id: String,
        source: SinkError,
        result: Box<JobResult>,
    },
}

impl From<ProviderError> for OrchestratorError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Graph(e) => Self::Validation(e),
            other => Self::Configuration(ConfigurationError::Provider(other)),
        }
    }
}

impl OrchestratorError {
    /// Map orchestrator error to protocol error code
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Configuration(ConfigurationError::Provider(ProviderError::Io { .. })) => {
                ErrorCode::IoError
            }
            Self::Configuration(_) => ErrorCode::ConfigError,
            Self::Validation(e) => e.error_code(),
            Self::System(_) => ErrorCode::SystemError,
            Self::Sink { .. } => ErrorCode::SinkError,
        }
    }
}
