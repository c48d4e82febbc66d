use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use agentflow_core::api::{
    default_results_dir, AgentKind, AppConfig, ExecutorConfig, ExecutorRegistry, ExecutorType,
    GraphProvider, OutputFormat, ResultSink, StatusPublisher,
};

use crate::executor::{CommandExecutor, EchoExecutor};
use crate::provider::FilePlaybookProvider;
use crate::publisher::{JsonlPublisher, ProgressPublisher, TracingPublisher};
use crate::sink::JsonFileSink;

const BUILTIN_KINDS: [AgentKind; 4] = [
    AgentKind::Ingestion,
    AgentKind::Query,
    AgentKind::Management,
    AgentKind::Custom,
];

/// Build the executor registry from `[executors.*]`.
///
/// Every built-in kind name gets an echo executor unless configured otherwise,
/// so playbooks that only use kinds run out of the box.
pub fn build_registry(cfg: &AppConfig) -> Result<ExecutorRegistry> {
    let mut registry = ExecutorRegistry::new();
    for kind in BUILTIN_KINDS {
        registry.register(kind.as_str(), Arc::new(EchoExecutor));
    }

    for (routing_key, exec_cfg) in &cfg.executors {
        registry.register(routing_key.clone(), build_executor(routing_key, exec_cfg)?);
    }

    tracing::debug!(routing_keys = ?registry.routing_keys(), "executor registry built");
    Ok(registry)
}

pub fn build_executor(
    routing_key: &str,
    cfg: &ExecutorConfig,
) -> Result<Arc<dyn agentflow_core::api::AgentExecutor>> {
    match cfg.executor_type {
        ExecutorType::Echo => Ok(Arc::new(EchoExecutor)),
        ExecutorType::Command => {
            let program = cfg
                .program
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| {
                    anyhow::anyhow!("executor '{routing_key}' has type \"command\" but no program")
                })?;
            let mut exec = CommandExecutor::new(routing_key, program)
                .args(cfg.args.iter().cloned())
                .envs(cfg.env.clone());
            if let Some(cwd) = &cfg.cwd {
                exec = exec.cwd(cwd);
            }
            Ok(Arc::new(exec))
        }
    }
}

/// Publishers for a run: tracing always; JSONL on stdout or a progress bar.
pub fn build_publishers(format: OutputFormat, progress_bar: bool) -> Vec<Arc<dyn StatusPublisher>> {
    let mut publishers: Vec<Arc<dyn StatusPublisher>> = vec![Arc::new(TracingPublisher)];
    match format {
        OutputFormat::Jsonl => publishers.push(Arc::new(JsonlPublisher::stdout())),
        OutputFormat::Text if progress_bar => publishers.push(Arc::new(ProgressPublisher::new())),
        OutputFormat::Text => {}
    }
    publishers
}

/// JSON-file sink under the override directory, `[sink] directory`, or the default.
pub fn build_sink(cfg: &AppConfig, dir_override: Option<PathBuf>) -> Result<Option<Arc<dyn ResultSink>>> {
    if !cfg.sink.enabled && dir_override.is_none() {
        return Ok(None);
    }
    let dir = match dir_override {
        Some(dir) => dir,
        None => match cfg.sink.directory.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_results_dir()?,
        },
    };
    Ok(Some(Arc::new(JsonFileSink::new(dir))))
}

pub fn build_provider(playbook_dir: Option<PathBuf>) -> Arc<dyn GraphProvider> {
    match playbook_dir {
        Some(dir) => Arc::new(FilePlaybookProvider::with_dir(dir)),
        None => Arc::new(FilePlaybookProvider::new()),
    }
}
