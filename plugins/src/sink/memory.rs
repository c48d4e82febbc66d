use std::sync::Mutex;

use agentflow_core::api::{ExecutionLogEntry, ResultSink, SinkError};
use async_trait::async_trait;
use serde_json::Value;

use super::json_file::SavedJob;

/// Keeps saved jobs in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    jobs: Mutex<Vec<SavedJob>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<SavedJob> {
        self.jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn get(&self, job_id: &str) -> Option<SavedJob> {
        self.jobs().into_iter().find(|j| j.job_id == job_id)
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(
        &self,
        job_id: &str,
        synthesized_output: &Value,
        execution_log: &[ExecutionLogEntry],
    ) -> Result<(), SinkError> {
        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| SinkError::Other("memory sink lock poisoned".to_string()))?;
        jobs.push(SavedJob {
            job_id: job_id.to_string(),
            status: agentflow_core::api::JobStatus::from_log(execution_log),
            saved_at: chrono::Utc::now(),
            synthesized_output: synthesized_output.clone(),
            execution_log: execution_log.to_vec(),
        });
        Ok(())
    }
}
