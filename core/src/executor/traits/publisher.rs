use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PublishError;
use crate::executor::types::{AgentStatus, JobStatus};

/// Agent state transitions reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentPhase {
    Invoking,
    Success,
    Cached,
    Error,
    Skipped,
}

impl AgentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoking => "invoking",
            Self::Success => "success",
            Self::Cached => "cached",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

impl From<AgentStatus> for AgentPhase {
    fn from(status: AgentStatus) -> Self {
        match status {
            AgentStatus::Success => Self::Success,
            AgentStatus::Cached => Self::Cached,
            AgentStatus::Error => Self::Error,
            AgentStatus::Skipped => Self::Skipped,
        }
    }
}

/// Progress event (unified event type)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    JobStarted {
        job_id: String,
        total_agents: usize,
        total_levels: usize,
        timestamp: DateTime<Utc>,
    },
    LevelStarted {
        job_id: String,
        level: usize,
        agents: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    Agent {
        job_id: String,
        agent_id: String,
        status: AgentPhase,
        /// Error message or skip reason
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        timestamp: DateTime<Utc>,
    },
    JobFinished {
        job_id: String,
        status: JobStatus,
        cancelled: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl StatusEvent {
    pub fn agent(job_id: &str, agent_id: &str, status: AgentPhase, detail: Option<String>) -> Self {
        Self::Agent {
            job_id: job_id.to_string(),
            agent_id: agent_id.to_string(),
            status,
            detail,
            timestamp: Utc::now(),
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            Self::JobStarted { job_id, .. }
            | Self::LevelStarted { job_id, .. }
            | Self::Agent { job_id, .. }
            | Self::JobFinished { job_id, .. } => job_id,
        }
    }
}

/// Fire-and-forget observer of job progress.
///
/// Errors are logged by the engine and never abort a job.
pub trait StatusPublisher: Send + Sync {
    fn name(&self) -> &str;

    fn publish(&self, event: &StatusEvent) -> Result<(), PublishError>;
}
