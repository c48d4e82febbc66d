//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `agentflow_core::api` instead of reaching into internal modules.

pub use crate::cache::{CacheEntry, MemoCache};
pub use crate::config::{
    default_results_dir, get_agentflow_data_dir, load_default, load_from_path, AppConfig,
    ExecutorConfig, ExecutorType, LoggingConfig, OutputConfig, OutputFormat, SinkConfig,
};
pub use crate::error::{
    AgentError, ConfigurationError, ErrorCode, OrchestratorError, ProviderError, PublishError,
    SinkError, SystemError, ValidationError,
};
pub use crate::executor::{
    AgentExecutor, AgentOutput, AgentPhase, AgentRequest, AgentStatus, EngineConfig,
    ExecutionEngine, ExecutionEngineBuilder, ExecutionLog, ExecutionLogEntry, ExecutionOpts,
    ExecutorRegistry, FailurePolicy, GraphProvider, JobContext, JobDescriptor, JobInput,
    JobResult, JobStatus, LeafOutputSynthesizer, Publishers, ResultSink, StatusEvent,
    StatusPublisher, Synthesizer,
};
pub use crate::executor::types::CANCELLED_REASONING;
pub use crate::graph::{
    plan, validate, AgentKind, AgentNode, Edge, ExecutionPlan, Graph, ValidatedGraph,
};
pub use crate::orchestrator::{JobOutcome, Orchestrator};
pub use crate::playbook::{AgentSpec, Playbook, PlaybookFormat};
