use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::graph::Graph;

/// Identifies the job to run and the playbook that describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Generated when absent.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Playbook name or path, interpreted by the provider.
    pub playbook: String,
}

impl JobDescriptor {
    pub fn new(playbook: impl Into<String>) -> Self {
        Self {
            job_id: None,
            playbook: playbook.into(),
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// Supplies the agent graph for a job.
#[async_trait]
pub trait GraphProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn load(&self, descriptor: &JobDescriptor) -> Result<Graph, ProviderError>;
}
