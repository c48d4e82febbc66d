use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use agentflow_core::api::{AgentPhase, JobStatus, PublishError, StatusEvent, StatusPublisher};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Visual progress for a running job
///
/// One overall bar counting finished agents plus a spinner per agent in flight.
pub struct ProgressPublisher {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

#[derive(Default)]
struct ProgressState {
    overall: Option<ProgressBar>,
    agent_bars: HashMap<String, ProgressBar>,
    total_levels: usize,
}

impl ProgressPublisher {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Progress that is tracked but never drawn.
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn overall_style() -> Result<ProgressStyle, PublishError> {
        Ok(ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} agents ({percent}%) {msg}")
            .map_err(|e| PublishError(e.to_string()))?
            .progress_chars("█▓▒░  "))
    }

    fn spinner_style() -> Result<ProgressStyle, PublishError> {
        Ok(ProgressStyle::default_spinner()
            .template("  {spinner:.green} {msg}")
            .map_err(|e| PublishError(e.to_string()))?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
    }

    /// Number of finished agents, if a job has started.
    pub fn position(&self) -> Option<u64> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.overall.as_ref().map(|b| b.position()))
    }

    fn finish_agent(state: &mut ProgressState, agent_id: &str, phase: AgentPhase) {
        let icon = match phase {
            AgentPhase::Success => "✅",
            AgentPhase::Cached => "♻️",
            AgentPhase::Error => "❌",
            AgentPhase::Skipped => "⏭️",
            AgentPhase::Invoking => return,
        };
        if let Some(bar) = state.agent_bars.remove(agent_id) {
            bar.finish_with_message(format!("{icon} {agent_id}"));
        }
        if let Some(overall) = &state.overall {
            overall.inc(1);
        }
    }
}

impl Default for ProgressPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPublisher for ProgressPublisher {
    fn name(&self) -> &str {
        "progress"
    }

    fn publish(&self, event: &StatusEvent) -> Result<(), PublishError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| PublishError("progress state lock poisoned".to_string()))?;

        match event {
            StatusEvent::JobStarted {
                total_agents,
                total_levels,
                ..
            } => {
                let overall = self.multi.add(ProgressBar::new(*total_agents as u64));
                overall.set_style(Self::overall_style()?);
                overall.set_message("Starting...");
                state.overall = Some(overall);
                state.total_levels = *total_levels;
            }
            StatusEvent::LevelStarted { level, .. } => {
                if let Some(overall) = &state.overall {
                    overall.set_message(format!("Level {}/{}", level + 1, state.total_levels));
                }
            }
            StatusEvent::Agent {
                agent_id, status, ..
            } => match status {
                AgentPhase::Invoking => {
                    let bar = self.multi.add(ProgressBar::new_spinner());
                    bar.set_style(Self::spinner_style()?);
                    bar.set_message(format!("⏳ {agent_id}"));
                    bar.enable_steady_tick(Duration::from_millis(100));
                    state.agent_bars.insert(agent_id.clone(), bar);
                }
                phase => Self::finish_agent(&mut state, agent_id, *phase),
            },
            StatusEvent::JobFinished {
                status, cancelled, ..
            } => {
                let msg = match (status, *cancelled) {
                    (JobStatus::Failed, _) => "❌ Job failed",
                    (JobStatus::Completed, true) => "⏹️ Job cancelled",
                    (JobStatus::Completed, false) => "✅ All agents completed",
                };
                for (_, bar) in state.agent_bars.drain() {
                    bar.finish_and_clear();
                }
                if let Some(overall) = &state.overall {
                    overall.finish_with_message(msg);
                }
            }
        }
        Ok(())
    }
}

impl Drop for ProgressPublisher {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut() {
            for (_, bar) in state.agent_bars.drain() {
                bar.finish_and_clear();
            }
        }
    }
}
