use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::cache::CacheEntry;
use crate::error::{AgentError, SystemError};
use crate::graph::{AgentNode, Graph, ValidatedGraph};

use super::context::JobContext;
use super::output::Publishers;
use super::traits::{AgentExecutor, AgentPhase};
use super::types::{
    AgentOutput, AgentRequest, ExecutionLogEntry, ExecutionOpts, FailurePolicy, CANCELLED_REASONING,
};

/// Everything a level needs that stays fixed for the whole job.
pub(crate) struct LevelScope<'a> {
    pub ctx: &'a JobContext,
    pub graph: &'a ValidatedGraph,
    pub handlers: &'a HashMap<String, Arc<dyn AgentExecutor>>,
    pub publishers: &'a Publishers,
    pub opts: &'a ExecutionOpts,
    /// Stops dispatch of agents that have not started yet.
    pub cancel: &'a CancellationToken,
}

/// Entries of one level, in the order their outcomes were determined.
#[derive(Debug, Default)]
pub(crate) struct LevelOutcome {
    pub entries: Vec<ExecutionLogEntry>,
    /// First agent of the level that ended in error.
    pub first_failure: Option<String>,
    pub cancelled: bool,
}

enum AgentRun {
    Finished {
        agent_id: String,
        result: Result<AgentOutput, AgentError>,
        elapsed_ms: u64,
    },
    /// Job cancelled before the agent got a concurrency slot.
    Cancelled { agent_id: String },
    /// A peer failed before this agent got a slot, or while it ran under
    /// [`FailurePolicy::CancelLevel`].
    Aborted { agent_id: String },
    LimiterClosed,
}

/// Execute a single level of agents in parallel
///
/// Cache hits are resolved up front; the remaining agents are dispatched at
/// most `max_concurrency` at a time. Once a peer fails, agents still waiting
/// for a slot are not dispatched under either policy. Returns once every agent
/// of the level has an outcome.
pub(crate) async fn execute_level_parallel(
    scope: &LevelScope<'_>,
    level: usize,
    agent_ids: &[String],
) -> Result<LevelOutcome, SystemError> {
    let job_id = scope.ctx.job_id();
    let limiter = Arc::new(Semaphore::new(scope.opts.max_concurrency.max(1)));
    // queued peers stop on the first failure; running ones only under CancelLevel
    let level_failed = CancellationToken::new();
    let level_abort = CancellationToken::new();

    let mut outcome = LevelOutcome {
        entries: Vec::with_capacity(agent_ids.len()),
        ..LevelOutcome::default()
    };
    let mut futs = FuturesUnordered::new();

    for agent_id in agent_ids {
        let node = node_of(scope.graph, agent_id)?;

        if let Some(hit) = scope.ctx.cache().get(agent_id)? {
            tracing::debug!(job_id, agent_id = %agent_id, level, "cache hit");
            scope
                .publishers
                .agent(job_id, agent_id, AgentPhase::Cached, None);
            outcome
                .entries
                .push(ExecutionLogEntry::cached(node, hit.output, hit.reasoning));
            continue;
        }

        let executor = scope
            .handlers
            .get(agent_id)
            .cloned()
            .ok_or_else(|| SystemError::PlanMismatch(agent_id.clone()))?;

        let request = AgentRequest {
            job_id: job_id.to_string(),
            agent_id: agent_id.clone(),
            display_name: node.display_name.clone(),
            routing_key: node.routing_key.clone(),
            job_input: scope.ctx.payload(),
            dependency_outputs: gather_dependency_outputs(scope.ctx, scope.graph, agent_id)?,
        };
        let timeout = node.timeout.unwrap_or(scope.opts.agent_timeout);

        futs.push(dispatch(
            request,
            executor,
            timeout,
            limiter.clone(),
            scope.cancel.clone(),
            level_failed.clone(),
            level_abort.clone(),
            scope.publishers.clone(),
        ));
    }

    while let Some(run) = futs.next().await {
        match run {
            AgentRun::Finished {
                agent_id,
                result: Ok(output),
                elapsed_ms,
            } => {
                let node = node_of(scope.graph, &agent_id)?;
                scope
                    .ctx
                    .cache()
                    .put(
                        agent_id.clone(),
                        CacheEntry::new(output.output.clone())
                            .with_reasoning(output.reasoning.clone()),
                    )?;
                tracing::info!(job_id, agent_id = %agent_id, level, elapsed_ms, "agent succeeded");
                scope
                    .publishers
                    .agent(job_id, &agent_id, AgentPhase::Success, None);
                outcome.entries.push(ExecutionLogEntry::success(
                    node,
                    output.output,
                    output.reasoning,
                    elapsed_ms,
                ));
            }
            AgentRun::Finished {
                agent_id,
                result: Err(err),
                elapsed_ms,
            } => {
                let node = node_of(scope.graph, &agent_id)?;
                let message = err.to_string();
                tracing::warn!(job_id, agent_id = %agent_id, level, elapsed_ms, error = %message, "agent failed");
                scope.publishers.agent(
                    job_id,
                    &agent_id,
                    AgentPhase::Error,
                    Some(message.clone()),
                );
                outcome
                    .entries
                    .push(ExecutionLogEntry::error(node, message, elapsed_ms));

                if outcome.first_failure.is_none() {
                    outcome.first_failure = Some(agent_id);
                    level_failed.cancel();
                    if scope.opts.failure_policy == FailurePolicy::CancelLevel {
                        level_abort.cancel();
                    }
                }
            }
            AgentRun::Cancelled { agent_id } => {
                let node = node_of(scope.graph, &agent_id)?;
                outcome.cancelled = true;
                scope.publishers.agent(
                    job_id,
                    &agent_id,
                    AgentPhase::Skipped,
                    Some(CANCELLED_REASONING.to_string()),
                );
                outcome.entries.push(ExecutionLogEntry::cancelled(node));
            }
            AgentRun::Aborted { agent_id } => {
                let node = node_of(scope.graph, &agent_id)?;
                let failed = outcome.first_failure.clone().unwrap_or_default();
                tracing::debug!(job_id, agent_id = %agent_id, failed_agent = %failed, "agent aborted");
                scope.publishers.agent(
                    job_id,
                    &agent_id,
                    AgentPhase::Skipped,
                    Some(format!("peer '{failed}' failed")),
                );
                outcome
                    .entries
                    .push(ExecutionLogEntry::skipped(node, &failed));
            }
            AgentRun::LimiterClosed => return Err(SystemError::LimiterClosed),
        }
    }

    Ok(outcome)
}

async fn dispatch(
    request: AgentRequest,
    executor: Arc<dyn AgentExecutor>,
    timeout: Duration,
    limiter: Arc<Semaphore>,
    job_cancel: CancellationToken,
    level_failed: CancellationToken,
    level_abort: CancellationToken,
    publishers: Publishers,
) -> AgentRun {
    let agent_id = request.agent_id.clone();

    let permit = tokio::select! {
        biased;
        _ = job_cancel.cancelled() => return AgentRun::Cancelled { agent_id },
        _ = level_failed.cancelled() => return AgentRun::Aborted { agent_id },
        permit = limiter.acquire_owned() => permit,
    };
    let Ok(_permit) = permit else {
        return AgentRun::LimiterClosed;
    };

    publishers.agent(&request.job_id, &agent_id, AgentPhase::Invoking, None);
    tracing::debug!(
        job_id = %request.job_id,
        agent_id = %agent_id,
        executor = executor.name(),
        "invoking agent"
    );

    let started = Instant::now();
    let timeout_ms = timeout.as_millis() as u64;
    // Spawned so a panicking executor surfaces as a JoinError instead of
    // unwinding through the engine.
    let mut handle = tokio::spawn(async move {
        match tokio::time::timeout(timeout, executor.invoke(request)).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::Timeout(timeout_ms)),
        }
    });

    let joined = tokio::select! {
        biased;
        _ = level_abort.cancelled() => {
            handle.abort();
            return AgentRun::Aborted { agent_id };
        }
        joined = &mut handle => joined,
    };

    let result = joined.unwrap_or_else(|e| Err(join_error(e)));
    AgentRun::Finished {
        agent_id,
        result,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }
}

fn join_error(err: JoinError) -> AgentError {
    if !err.is_panic() {
        return AgentError::failed("executor task was cancelled");
    }
    let panic = err.into_panic();
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    AgentError::Panicked(message)
}

fn node_of<'g>(graph: &'g Graph, agent_id: &str) -> Result<&'g AgentNode, SystemError> {
    graph
        .node(agent_id)
        .ok_or_else(|| SystemError::PlanMismatch(agent_id.to_string()))
}

/// Outputs of every dependency, read from the cache.
///
/// Dependencies live in earlier levels, which have fully drained, so a miss
/// means the plan and the graph disagree.
fn gather_dependency_outputs(
    ctx: &JobContext,
    graph: &Graph,
    agent_id: &str,
) -> Result<BTreeMap<String, Value>, SystemError> {
    let mut outputs = BTreeMap::new();
    for dep in graph.dependencies_of(agent_id) {
        let entry = ctx.cache().get(dep)?.ok_or_else(|| {
            SystemError::MissingDependencyOutput {
                agent_id: agent_id.to_string(),
                dependency: dep.clone(),
            }
        })?;
        outputs.insert(dep.clone(), entry.output);
    }
    Ok(outputs)
}
