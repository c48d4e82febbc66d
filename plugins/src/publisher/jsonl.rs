use std::io::Write;
use std::sync::Mutex;

use agentflow_core::api::{PublishError, StatusEvent, StatusPublisher};
use serde_json::{json, Value};

/// Writes one JSON object per status event (`v`, `event_type`, `ts`, ...).
pub struct JsonlPublisher {
    out: Mutex<Box<dyn Write + Send>>,
    pretty_print: bool,
}

impl JsonlPublisher {
    pub fn new(out: Box<dyn Write + Send>, pretty_print: bool) -> Self {
        Self {
            out: Mutex::new(out),
            pretty_print,
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()), false)
    }
}

pub fn event_to_json(event: &StatusEvent) -> Value {
    match event {
        StatusEvent::JobStarted {
            job_id,
            total_agents,
            total_levels,
            timestamp,
        } => json!({
            "v": 1,
            "event_type": "job.start",
            "ts": timestamp.to_rfc3339(),
            "job_id": job_id,
            "metadata": {
                "total_agents": total_agents,
                "total_levels": total_levels,
            }
        }),
        StatusEvent::LevelStarted {
            job_id,
            level,
            agents,
            timestamp,
        } => json!({
            "v": 1,
            "event_type": "level.start",
            "ts": timestamp.to_rfc3339(),
            "job_id": job_id,
            "metadata": {
                "level": level,
                "agents": agents,
            }
        }),
        StatusEvent::Agent {
            job_id,
            agent_id,
            status,
            detail,
            timestamp,
        } => json!({
            "v": 1,
            "event_type": format!("agent.{}", status.as_str()),
            "ts": timestamp.to_rfc3339(),
            "job_id": job_id,
            "agent_id": agent_id,
            "metadata": {
                "detail": detail,
            }
        }),
        StatusEvent::JobFinished {
            job_id,
            status,
            cancelled,
            duration_ms,
            timestamp,
        } => json!({
            "v": 1,
            "event_type": "job.end",
            "ts": timestamp.to_rfc3339(),
            "job_id": job_id,
            "metadata": {
                "status": status.as_str(),
                "cancelled": cancelled,
                "duration_ms": duration_ms,
            }
        }),
    }
}

impl StatusPublisher for JsonlPublisher {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn publish(&self, event: &StatusEvent) -> Result<(), PublishError> {
        let value = event_to_json(event);
        let line = if self.pretty_print {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        }
        .map_err(|e| PublishError(e.to_string()))?;

        let mut out = self
            .out
            .lock()
            .map_err(|_| PublishError("jsonl writer lock poisoned".to_string()))?;
        writeln!(out, "{line}").map_err(|e| PublishError(e.to_string()))?;
        out.flush().map_err(|e| PublishError(e.to_string()))
    }
}
