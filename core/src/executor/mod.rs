//! Memoized, level-parallel execution of validated agent graphs.
//!
//! # Architecture
//!
//! ```text
//! ValidatedGraph + ExecutionPlan + JobInput
//!   ↓
//! JobContext::new()            seeds the memo cache (resume)
//!   ↓
//! ExecutorRegistry::resolve()  routing_key -> AgentExecutor, before any dispatch
//!   ↓
//! for each level:
//!   execute_level_parallel()   cache hits, then Semaphore-bounded dispatch
//!   ↓
//! first failure -> remaining levels logged as skipped
//!   ↓
//! JobResult { status, execution_log, levels }
//! ```

mod context;
mod engine;
mod output;
mod registry;
mod scheduler;
pub mod traits;
pub mod types;

pub use context::{JobContext, JobInput};
pub use engine::{ExecutionEngine, ExecutionEngineBuilder};
pub use output::Publishers;
pub use registry::ExecutorRegistry;
pub use traits::{
    AgentExecutor, AgentPhase, GraphProvider, JobDescriptor, LeafOutputSynthesizer, ResultSink,
    StatusEvent, StatusPublisher, Synthesizer,
};
pub use types::{
    AgentOutput, AgentRequest, AgentStatus, EngineConfig, ExecutionLog, ExecutionLogEntry,
    ExecutionOpts, FailurePolicy, JobResult, JobStatus,
};
