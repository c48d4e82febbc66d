pub mod agent;
pub mod codes;
pub mod graph;
pub mod orchestrator;

pub use agent::AgentError;
pub use codes::ErrorCode;
pub use graph::ValidationError;
pub use orchestrator::{
    ConfigurationError, OrchestratorError, ProviderError, PublishError, SinkError, SystemError,
};
