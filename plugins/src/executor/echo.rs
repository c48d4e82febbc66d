use agentflow_core::api::{AgentError, AgentExecutor, AgentOutput, AgentRequest};
use async_trait::async_trait;
use serde_json::json;

/// Returns what it was given. Used for dry runs and playbook smoke tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoExecutor;

#[async_trait]
impl AgentExecutor for EchoExecutor {
    fn name(&self) -> &str {
        "echo"
    }

    async fn invoke(&self, request: AgentRequest) -> Result<AgentOutput, AgentError> {
        let output = json!({
            "agent_id": request.agent_id,
            "routing_key": request.routing_key,
            "job_input": request.job_input.as_ref(),
            "dependency_outputs": request.dependency_outputs,
        });
        Ok(AgentOutput::new(output).with_reasoning(format!("echo of {}", request.display_name)))
    }
}
