use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::AgentNode;

/// Terminal outcome of one agent within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Success,
    Cached,
    Error,
    Skipped,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Cached => "cached",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

/// One row of the execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub agent_id: String,
    pub display_name: String,
    pub status: AgentStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reasoning: String,
    /// `None` for error and skipped entries.
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Agent whose failure caused this skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<String>,
    pub execution_time_ms: u64,
}

pub const CANCELLED_REASONING: &str = "cancelled";

impl ExecutionLogEntry {
    fn base(node: &AgentNode, status: AgentStatus) -> Self {
        Self {
            agent_id: node.agent_id.clone(),
            display_name: node.display_name.clone(),
            status,
            timestamp: Utc::now(),
            reasoning: String::new(),
            output: None,
            error_message: None,
            caused_by: None,
            execution_time_ms: 0,
        }
    }

    pub fn success(node: &AgentNode, output: Value, reasoning: String, elapsed_ms: u64) -> Self {
        Self {
            output: Some(output),
            reasoning,
            execution_time_ms: elapsed_ms,
            ..Self::base(node, AgentStatus::Success)
        }
    }

    /// `reasoning` is whatever the executor said when the output was produced.
    pub fn cached(node: &AgentNode, output: Value, reasoning: String) -> Self {
        Self {
            output: Some(output),
            reasoning,
            ..Self::base(node, AgentStatus::Cached)
        }
    }

    pub fn error(node: &AgentNode, message: String, elapsed_ms: u64) -> Self {
        Self {
            error_message: Some(message),
            execution_time_ms: elapsed_ms,
            ..Self::base(node, AgentStatus::Error)
        }
    }

    pub fn skipped(node: &AgentNode, failed_agent: &str) -> Self {
        Self {
            reasoning: format!("skipped: agent '{failed_agent}' failed"),
            caused_by: Some(failed_agent.to_string()),
            ..Self::base(node, AgentStatus::Skipped)
        }
    }

    pub fn cancelled(node: &AgentNode) -> Self {
        Self {
            reasoning: CANCELLED_REASONING.to_string(),
            ..Self::base(node, AgentStatus::Skipped)
        }
    }
}

/// Append-only execution log.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    entries: Vec<ExecutionLogEntry>,
}

impl ExecutionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: ExecutionLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ExecutionLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<ExecutionLogEntry> {
        self.entries
    }
}

impl Extend<ExecutionLogEntry> for ExecutionLog {
    fn extend<I: IntoIterator<Item = ExecutionLogEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

impl JobStatus {
    /// `Failed` iff at least one entry is an error.
    pub fn from_log(entries: &[ExecutionLogEntry]) -> Self {
        if entries.iter().any(|e| e.status == AgentStatus::Error) {
            Self::Failed
        } else {
            Self::Completed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Terminal artifact of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub status: JobStatus,
    /// Set when dispatch stopped because of cancellation or the job timeout.
    #[serde(default)]
    pub cancelled: bool,
    pub execution_log: Vec<ExecutionLogEntry>,
    /// Execution levels (for debugging)
    #[serde(default)]
    pub levels: Vec<Vec<String>>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl JobResult {
    pub fn new(
        job_id: String,
        execution_log: Vec<ExecutionLogEntry>,
        levels: Vec<Vec<String>>,
        cancelled: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            job_id,
            status: JobStatus::from_log(&execution_log),
            cancelled,
            execution_log,
            levels,
            started_at,
            finished_at,
            duration_ms,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    pub fn entry(&self, agent_id: &str) -> Option<&ExecutionLogEntry> {
        self.execution_log.iter().find(|e| e.agent_id == agent_id)
    }

    pub fn count(&self, status: AgentStatus) -> usize {
        self.execution_log
            .iter()
            .filter(|e| e.status == status)
            .count()
    }

    pub fn first_error(&self) -> Option<&ExecutionLogEntry> {
        self.execution_log
            .iter()
            .find(|e| e.status == AgentStatus::Error)
    }

    /// Outputs of every success or cached entry, usable as resume seeds.
    pub fn successful_outputs(&self) -> BTreeMap<String, Value> {
        self.execution_log
            .iter()
            .filter(|e| matches!(e.status, AgentStatus::Success | AgentStatus::Cached))
            .filter_map(|e| e.output.clone().map(|o| (e.agent_id.clone(), o)))
            .collect()
    }
}
