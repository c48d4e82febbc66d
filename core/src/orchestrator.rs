use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::OrchestratorError;
use crate::executor::{
    ExecutionEngine, GraphProvider, JobDescriptor, JobInput, JobResult, LeafOutputSynthesizer,
    ResultSink, Synthesizer,
};
use crate::graph::{plan, ExecutionPlan, ValidatedGraph};

/// Result of a job that ran and was persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobOutcome {
    pub result: JobResult,
    pub synthesized_output: Value,
}

/// Drives one job end to end: load, validate, plan, execute, synthesize, save.
///
/// Configuration and validation errors are returned before any agent runs.
/// Once execution has begun the caller always gets the complete `JobResult`,
/// either in the outcome or inside `OrchestratorError::Sink`.
pub struct Orchestrator {
    provider: Arc<dyn GraphProvider>,
    engine: ExecutionEngine,
    sink: Option<Arc<dyn ResultSink>>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn GraphProvider>, engine: ExecutionEngine) -> Self {
        Self {
            provider,
            engine,
            sink: None,
            synthesizer: Arc::new(LeafOutputSynthesizer),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Load the playbook and validate its graph.
    pub async fn load(&self, descriptor: &JobDescriptor) -> Result<ValidatedGraph, OrchestratorError> {
        let graph = self.provider.load(descriptor).await?;
        tracing::debug!(
            provider = self.provider.name(),
            playbook = %descriptor.playbook,
            agents = graph.len(),
            edges = graph.edge_count(),
            "graph loaded"
        );

        match graph.validate() {
            Ok(validated) => Ok(validated),
            Err(e) => {
                tracing::warn!(playbook = %descriptor.playbook, error = %e, "graph rejected");
                Err(e.into())
            }
        }
    }

    /// Load, validate and plan without executing anything.
    pub async fn plan(
        &self,
        descriptor: &JobDescriptor,
    ) -> Result<(ValidatedGraph, ExecutionPlan), OrchestratorError> {
        let graph = self.load(descriptor).await?;
        let plan = plan(&graph);
        Ok((graph, plan))
    }

    pub async fn run(
        &self,
        descriptor: &JobDescriptor,
        payload: Value,
    ) -> Result<JobOutcome, OrchestratorError> {
        self.run_with(descriptor, JobInput::new(payload)).await
    }

    /// Run a job with a fully specified input (seed outputs, cancellation).
    ///
    /// A job id on the descriptor takes precedence over the input's.
    #[tracing::instrument(name = "orchestrator.run", skip_all, fields(playbook = %descriptor.playbook))]
    pub async fn run_with(
        &self,
        descriptor: &JobDescriptor,
        mut input: JobInput,
    ) -> Result<JobOutcome, OrchestratorError> {
        if let Some(job_id) = &descriptor.job_id {
            input.job_id = job_id.clone();
        }

        let (graph, plan) = self.plan(descriptor).await?;
        tracing::info!(
            job_id = %input.job_id,
            agents = graph.len(),
            levels = plan.len(),
            seeded = input.seed_outputs.len(),
            "execution plan ready"
        );

        let result = self.engine.execute(&graph, &plan, input).await?;
        let synthesized_output = self.synthesizer.synthesize(&graph, &result);

        if let Some(sink) = &self.sink {
            if let Err(source) = sink
                .save(&result.job_id, &synthesized_output, &result.execution_log)
                .await
            {
                tracing::error!(
                    job_id = %result.job_id,
                    sink = sink.name(),
                    error = %source,
                    "result sink failed"
                );
                return Err(OrchestratorError::Sink {
                    job_id: result.job_id.clone(),
                    source,
                    result: Box::new(result),
                });
            }
            tracing::debug!(job_id = %result.job_id, sink = sink.name(), "result saved");
        }

        Ok(JobOutcome {
            result,
            synthesized_output,
        })
    }
}
