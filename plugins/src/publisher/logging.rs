use agentflow_core::api::{AgentPhase, PublishError, StatusEvent, StatusPublisher};

/// Forwards status events to `tracing` under the `agentflow::status` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPublisher;

impl StatusPublisher for TracingPublisher {
    fn name(&self) -> &str {
        "tracing"
    }

    fn publish(&self, event: &StatusEvent) -> Result<(), PublishError> {
        match event {
            StatusEvent::JobStarted {
                job_id,
                total_agents,
                total_levels,
                ..
            } => {
                tracing::info!(target: "agentflow::status", job_id = %job_id, total_agents, total_levels, "job.start");
            }
            StatusEvent::LevelStarted {
                job_id,
                level,
                agents,
                ..
            } => {
                tracing::info!(target: "agentflow::status", job_id = %job_id, level, agents = agents.len(), "level.start");
            }
            StatusEvent::Agent {
                job_id,
                agent_id,
                status,
                detail,
                ..
            } => match status {
                AgentPhase::Error => tracing::warn!(
                    target: "agentflow::status",
                    job_id = %job_id,
                    agent_id = %agent_id,
                    detail = detail.as_deref().unwrap_or_default(),
                    "agent.error"
                ),
                other => tracing::info!(
                    target: "agentflow::status",
                    job_id = %job_id,
                    agent_id = %agent_id,
                    status = other.as_str(),
                    detail = detail.as_deref().unwrap_or_default(),
                    "agent.status"
                ),
            },
            StatusEvent::JobFinished {
                job_id,
                status,
                cancelled,
                duration_ms,
                ..
            } => {
                tracing::info!(
                    target: "agentflow::status",
                    job_id = %job_id,
                    status = status.as_str(),
                    cancelled,
                    duration_ms,
                    "job.end"
                );
            }
        }
        Ok(())
    }
}
