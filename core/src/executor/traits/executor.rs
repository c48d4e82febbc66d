use async_trait::async_trait;

use crate::error::AgentError;
use crate::executor::types::{AgentOutput, AgentRequest};

/// Performs the actual work of an agent.
///
/// Called concurrently for different agents of the same level, so
/// implementations must not assume exclusive access to shared state.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(&self, request: AgentRequest) -> Result<AgentOutput, AgentError>;
}
