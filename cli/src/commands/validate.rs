use std::path::PathBuf;

use agentflow_core::api::{
    plan, AppConfig, ExecutionPlan, JobDescriptor, OrchestratorError, ValidatedGraph,
};
use agentflow_plugins::factory::{build_provider, build_registry};

use super::cli::PlaybookArgs;
use crate::error::CliError;

/// Load, validate and plan a playbook, and check every routing key resolves.
pub async fn load_checked(
    args: &PlaybookArgs,
    playbook_dir: Option<PathBuf>,
    cfg: &AppConfig,
) -> Result<(ValidatedGraph, ExecutionPlan), CliError> {
    let provider = build_provider(playbook_dir);
    let descriptor = JobDescriptor::new(&args.playbook);

    let graph = provider
        .load(&descriptor)
        .await
        .map_err(OrchestratorError::from)?;
    let graph = graph.validate().map_err(OrchestratorError::from)?;

    let registry = build_registry(cfg).map_err(|e| CliError::Config(e.to_string()))?;
    registry.resolve(&graph).map_err(OrchestratorError::from)?;

    let plan = plan(&graph);
    Ok((graph, plan))
}

pub async fn validate_cmd(
    args: PlaybookArgs,
    playbook_dir: Option<PathBuf>,
    cfg: &AppConfig,
) -> Result<i32, CliError> {
    let (graph, plan) = load_checked(&args, playbook_dir, cfg).await?;
    println!(
        "OK {}: {} agents, {} edges, {} levels",
        args.playbook,
        graph.len(),
        graph.edge_count(),
        plan.len()
    );
    Ok(0)
}
