use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{OrchestratorError, SystemError};
use crate::graph::{ExecutionPlan, ValidatedGraph};

use super::context::{JobContext, JobInput};
use super::output::Publishers;
use super::registry::ExecutorRegistry;
use super::scheduler::{execute_level_parallel, LevelScope};
use super::traits::{AgentExecutor, AgentPhase, StatusEvent, StatusPublisher};
use super::types::{
    ExecutionLog, ExecutionLogEntry, ExecutionOpts, FailurePolicy, JobResult, CANCELLED_REASONING,
};

/// Level-by-level executor for validated agent graphs.
///
/// Levels run strictly one after another; agents within a level run in
/// parallel up to `max_concurrency`. The first failing level stops the job and
/// every agent of the later levels is logged as skipped.
pub struct ExecutionEngine {
    registry: Arc<ExecutorRegistry>,
    publishers: Publishers,
    opts: ExecutionOpts,
}

pub struct ExecutionEngineBuilder {
    registry: Arc<ExecutorRegistry>,
    publishers: Vec<Arc<dyn StatusPublisher>>,
    opts: ExecutionOpts,
}

impl ExecutionEngine {
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self::builder(registry).build()
    }

    pub fn builder(registry: ExecutorRegistry) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new(registry)
    }

    pub fn opts(&self) -> &ExecutionOpts {
        &self.opts
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    /// Execute `plan` against `graph` with a fresh job context.
    pub async fn execute(
        &self,
        graph: &ValidatedGraph,
        plan: &ExecutionPlan,
        input: JobInput,
    ) -> Result<JobResult, OrchestratorError> {
        let ctx = JobContext::new(input)?;
        self.run(&ctx, graph, plan).await
    }

    /// Execute `plan` within an existing job context.
    ///
    /// The context's cache is cleared when this returns, whatever the outcome.
    pub async fn run(
        &self,
        ctx: &JobContext,
        graph: &ValidatedGraph,
        plan: &ExecutionPlan,
    ) -> Result<JobResult, OrchestratorError> {
        let handlers = match self.registry.resolve(graph) {
            Ok(handlers) => handlers,
            Err(e) => {
                ctx.cache().clear();
                return Err(e.into());
            }
        };

        let cancel = ctx.cancel_token().child_token();
        let timer = self
            .opts
            .job_timeout
            .map(|timeout| spawn_job_timer(ctx.job_id(), timeout, cancel.clone()));

        let result = self.run_levels(ctx, graph, plan, &handlers, &cancel).await;

        if let Some(timer) = timer {
            timer.abort();
        }
        ctx.cache().clear();

        result.map_err(|e| {
            tracing::error!(job_id = ctx.job_id(), system_error = %e, "job aborted");
            OrchestratorError::from(e)
        })
    }

    async fn run_levels(
        &self,
        ctx: &JobContext,
        graph: &ValidatedGraph,
        plan: &ExecutionPlan,
        handlers: &HashMap<String, Arc<dyn AgentExecutor>>,
        cancel: &CancellationToken,
    ) -> Result<JobResult, SystemError> {
        for node in graph.nodes() {
            if plan.level_index(&node.agent_id).is_none() {
                return Err(SystemError::PlanMismatch(node.agent_id.clone()));
            }
        }

        let started_at = Utc::now();
        let job_id = ctx.job_id();
        let levels = plan.levels();

        tracing::info!(
            job_id,
            agents = graph.len(),
            levels = levels.len(),
            max_concurrency = self.opts.max_concurrency,
            failure_policy = self.opts.failure_policy.as_str(),
            "job started"
        );
        self.publishers.emit(&StatusEvent::JobStarted {
            job_id: job_id.to_string(),
            total_agents: graph.len(),
            total_levels: levels.len(),
            timestamp: started_at,
        });

        let scope = LevelScope {
            ctx,
            graph,
            handlers,
            publishers: &self.publishers,
            opts: &self.opts,
            cancel,
        };

        let mut log = ExecutionLog::with_capacity(graph.len());
        let mut failed_agent: Option<String> = None;
        let mut cancelled = false;
        let mut next_level = 0;

        while next_level < levels.len() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let agent_ids = &levels[next_level];
            tracing::debug!(job_id, level = next_level, agents = ?agent_ids, "level started");
            self.publishers.emit(&StatusEvent::LevelStarted {
                job_id: job_id.to_string(),
                level: next_level,
                agents: agent_ids.clone(),
                timestamp: Utc::now(),
            });

            let outcome = execute_level_parallel(&scope, next_level, agent_ids).await?;
            next_level += 1;
            log.extend(outcome.entries);
            cancelled |= outcome.cancelled;

            if let Some(agent_id) = outcome.first_failure {
                failed_agent = Some(agent_id);
                break;
            }
            if cancelled {
                break;
            }
        }

        let remaining: Vec<&String> = levels[next_level..].iter().flatten().collect();
        if !remaining.is_empty() {
            match &failed_agent {
                Some(failed) => tracing::warn!(
                    job_id,
                    failed_agent = %failed,
                    skipped = remaining.len(),
                    "stopping after failed level"
                ),
                None => tracing::warn!(
                    job_id,
                    skipped = remaining.len(),
                    "job cancelled before all levels ran"
                ),
            }
        }

        for agent_id in remaining {
            let node = graph
                .node(agent_id)
                .ok_or_else(|| SystemError::PlanMismatch(agent_id.clone()))?;
            let (entry, detail) = match &failed_agent {
                Some(failed) => (
                    ExecutionLogEntry::skipped(node, failed),
                    format!("agent '{failed}' failed"),
                ),
                None => (
                    ExecutionLogEntry::cancelled(node),
                    CANCELLED_REASONING.to_string(),
                ),
            };
            self.publishers
                .agent(job_id, agent_id, AgentPhase::Skipped, Some(detail));
            log.push(entry);
        }

        let result = JobResult::new(
            job_id.to_string(),
            log.into_entries(),
            levels.to_vec(),
            cancelled,
            started_at,
        );

        tracing::info!(
            job_id,
            status = result.status.as_str(),
            cancelled = result.cancelled,
            duration_ms = result.duration_ms,
            "job finished"
        );
        self.publishers.emit(&StatusEvent::JobFinished {
            job_id: job_id.to_string(),
            status: result.status,
            cancelled: result.cancelled,
            duration_ms: result.duration_ms,
            timestamp: result.finished_at,
        });

        Ok(result)
    }
}

fn spawn_job_timer(job_id: &str, timeout: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    let job_id = job_id.to_string();
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::warn!(
            job_id = %job_id,
            timeout_ms = timeout.as_millis() as u64,
            "job timeout reached, cancelling remaining dispatch"
        );
        cancel.cancel();
    })
}

impl ExecutionEngineBuilder {
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            publishers: Vec::new(),
            opts: ExecutionOpts::default(),
        }
    }

    pub fn publisher(mut self, publisher: Arc<dyn StatusPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    pub fn publishers(mut self, publishers: Vec<Arc<dyn StatusPublisher>>) -> Self {
        self.publishers.extend(publishers);
        self
    }

    pub fn opts(mut self, opts: ExecutionOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.opts.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn agent_timeout(mut self, timeout: Duration) -> Self {
        self.opts.agent_timeout = timeout;
        self
    }

    pub fn job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.opts.job_timeout = timeout;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.opts.failure_policy = policy;
        self
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            registry: self.registry,
            publishers: Publishers::new(self.publishers),
            opts: self.opts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::executor::types::{AgentOutput, AgentRequest, AgentStatus, JobStatus};
    use crate::graph::{AgentNode, Graph};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Echo;

    #[async_trait]
    impl AgentExecutor for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(&self, request: AgentRequest) -> Result<AgentOutput, AgentError> {
            Ok(AgentOutput::new(json!({
                "agent": request.agent_id,
                "deps": request.dependency_outputs.keys().cloned().collect::<Vec<_>>(),
            })))
        }
    }

    struct Fails;

    #[async_trait]
    impl AgentExecutor for Fails {
        fn name(&self) -> &str {
            "fails"
        }

        async fn invoke(&self, request: AgentRequest) -> Result<AgentOutput, AgentError> {
            Err(AgentError::failed(format!("{} broke", request.agent_id)))
        }
    }

    fn validated(nodes: Vec<AgentNode>) -> (ValidatedGraph, ExecutionPlan) {
        let graph = Graph::from_nodes(nodes)
            .expect("graph")
            .validate()
            .expect("valid");
        let plan = ExecutionPlan::from_graph(&graph);
        (graph, plan)
    }

    fn registry() -> ExecutorRegistry {
        ExecutorRegistry::new()
            .with("custom", Arc::new(Echo))
            .with("fail", Arc::new(Fails))
    }

    #[tokio::test]
    async fn test_linear_chain_passes_outputs_forward() {
        let (graph, plan) = validated(vec![
            AgentNode::new("a"),
            AgentNode::new("b").depends_on("a"),
        ]);
        let engine = ExecutionEngine::new(registry());

        let result = engine
            .execute(&graph, &plan, JobInput::new(Value::Null))
            .await
            .expect("run");

        assert_eq!(result.status, JobStatus::Completed);
        assert_eq!(result.execution_log.len(), 2);
        let b = result.entry("b").expect("b logged");
        assert_eq!(b.output.as_ref().expect("output")["deps"], json!(["a"]));
    }

    #[tokio::test]
    async fn test_failure_skips_later_levels() {
        let (graph, plan) = validated(vec![
            AgentNode::new("a").with_routing_key("fail"),
            AgentNode::new("b").depends_on("a"),
            AgentNode::new("c").depends_on("b"),
        ]);
        let engine = ExecutionEngine::new(registry());

        let result = engine
            .execute(&graph, &plan, JobInput::new(Value::Null))
            .await
            .expect("run");

        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.count(AgentStatus::Skipped), 2);
        assert_eq!(
            result.entry("c").and_then(|e| e.caused_by.as_deref()),
            Some("a")
        );
    }

    #[tokio::test]
    async fn test_unknown_routing_key_runs_nothing() {
        let (graph, plan) = validated(vec![
            AgentNode::new("a"),
            AgentNode::new("b").with_routing_key("nobody"),
        ]);
        let engine = ExecutionEngine::new(registry());

        let err = engine
            .execute(&graph, &plan, JobInput::new(Value::Null))
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_pre_cancelled_job_skips_everything() {
        let (graph, plan) = validated(vec![AgentNode::new("a"), AgentNode::new("b")]);
        let token = CancellationToken::new();
        token.cancel();
        let engine = ExecutionEngine::new(registry());

        let result = engine
            .execute(
                &graph,
                &plan,
                JobInput::new(Value::Null).with_cancellation(token),
            )
            .await
            .expect("run");

        assert!(result.cancelled);
        assert_eq!(result.status, JobStatus::Completed);
        assert_eq!(result.count(AgentStatus::Skipped), 2);
    }
}
