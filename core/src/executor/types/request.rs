use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything an executor receives for one agent invocation.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub job_id: String,
    pub agent_id: String,
    pub display_name: String,
    pub routing_key: String,
    pub job_input: Arc<Value>,
    /// dependency agent_id -> output
    pub dependency_outputs: BTreeMap<String, Value>,
}

impl AgentRequest {
    /// JSON form handed to out-of-process executors.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "job_id": self.job_id,
            "agent_id": self.agent_id,
            "display_name": self.display_name,
            "routing_key": self.routing_key,
            "job_input": self.job_input.as_ref(),
            "dependency_outputs": self.dependency_outputs,
        })
    }
}

/// Successful executor result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentOutput {
    pub output: Value,
    #[serde(default)]
    pub reasoning: String,
}

impl AgentOutput {
    pub fn new(output: Value) -> Self {
        Self {
            output,
            reasoning: String::new(),
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}
