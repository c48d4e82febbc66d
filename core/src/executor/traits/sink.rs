use async_trait::async_trait;
use serde_json::Value;

use crate::error::SinkError;
use crate::executor::types::ExecutionLogEntry;

/// Persists the outcome of a job. Invoked once per job, after execution.
#[async_trait]
pub trait ResultSink: Send + Sync {
    fn name(&self) -> &str;

    async fn save(
        &self,
        job_id: &str,
        synthesized_output: &Value,
        execution_log: &[ExecutionLogEntry],
    ) -> Result<(), SinkError>;
}
