use agentflow_core::api::{AgentStatus, ExecutionPlan, JobResult, OutputFormat};
use serde_json::{json, Value};

fn status_label(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Success => "SUCCESS",
        AgentStatus::Cached => "CACHED",
        AgentStatus::Error => "FAILED",
        AgentStatus::Skipped => "SKIPPED",
    }
}

/// Human-readable job summary.
pub fn format_result_text(result: &JobResult, synthesized_output: Option<&Value>) -> String {
    let mut out = format!(
        "JOB {} {}{} ({} agents, {} levels, {}ms)",
        result.job_id,
        result.status.as_str().to_uppercase(),
        if result.cancelled { " (cancelled)" } else { "" },
        result.execution_log.len(),
        result.levels.len(),
        result.duration_ms
    );

    let width = result
        .execution_log
        .iter()
        .map(|e| e.agent_id.len())
        .max()
        .unwrap_or(0);
    for entry in &result.execution_log {
        out.push_str(&format!(
            "\n  {:<width$}  {:<7}  {:>6}ms",
            entry.agent_id,
            status_label(entry.status),
            entry.execution_time_ms,
        ));
        if let Some(msg) = &entry.error_message {
            out.push_str(&format!("  {msg}"));
        } else if entry.status == AgentStatus::Skipped {
            out.push_str(&format!("  {}", entry.reasoning));
        }
    }

    if let Some(output) = synthesized_output {
        let pretty = serde_json::to_string_pretty(output).unwrap_or_else(|_| output.to_string());
        out.push_str("\nOUTPUT\n");
        out.push_str(&pretty);
    }
    out
}

/// Final JSONL line of a run, after the streamed status events.
pub fn result_to_json(result: &JobResult, synthesized_output: Option<&Value>) -> Value {
    json!({
        "v": 1,
        "event_type": "job.result",
        "job_id": result.job_id,
        "status": result.status.as_str(),
        "cancelled": result.cancelled,
        "duration_ms": result.duration_ms,
        "levels": result.levels,
        "execution_log": result.execution_log,
        "synthesized_output": synthesized_output,
    })
}

pub fn print_result(format: OutputFormat, result: &JobResult, synthesized_output: Option<&Value>) {
    match format {
        OutputFormat::Text => println!("{}", format_result_text(result, synthesized_output)),
        OutputFormat::Jsonl => println!("{}", result_to_json(result, synthesized_output)),
    }
}

pub fn format_plan_text(plan: &ExecutionPlan) -> String {
    let mut out = format!("PLAN ({} agents, {} levels):", plan.total_agents(), plan.len());
    for (idx, level) in plan.levels().iter().enumerate() {
        out.push_str(&format!("\n  level {}: {}", idx, level.join(", ")));
    }
    out
}
