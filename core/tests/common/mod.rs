#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentflow_core::api::{
    AgentError, AgentExecutor, AgentNode, AgentOutput, AgentPhase, AgentRequest, ExecutionEngine,
    ExecutionEngineBuilder, ExecutionLogEntry, ExecutorRegistry, ExecutionPlan, Graph,
    GraphProvider, JobDescriptor, ProviderError, PublishError, ResultSink, SinkError, StatusEvent,
    StatusPublisher, ValidatedGraph,
};
use async_trait::async_trait;
use serde_json::{json, Value};

/// What the scripted executor does for one agent.
#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed(Value),
    Fail(String),
    Sleep(Duration),
    Panic(String),
}

/// Executor whose behavior is scripted per agent id.
///
/// Unscripted agents succeed with `{"from": <agent_id>}`. Every request is
/// recorded; in-flight invocations are tracked to observe the concurrency cap.
#[derive(Default)]
pub struct ScriptedExecutor {
    behaviors: Mutex<HashMap<String, Behavior>>,
    requests: Mutex<Vec<AgentRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, agent_id: &str, behavior: Behavior) -> Self {
        self.behaviors
            .lock()
            .unwrap()
            .insert(agent_id.to_string(), behavior);
        self
    }

    pub fn invocations(&self, agent_id: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.agent_id == agent_id)
            .count()
    }

    pub fn total_invocations(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request_for(&self, agent_id: &str) -> Option<AgentRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.agent_id == agent_id)
            .cloned()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

pub fn default_output(agent_id: &str) -> Value {
    json!({ "from": agent_id })
}

#[async_trait]
impl AgentExecutor for ScriptedExecutor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, request: AgentRequest) -> Result<AgentOutput, AgentError> {
        let agent_id = request.agent_id.clone();
        let behavior = self.behaviors.lock().unwrap().get(&agent_id).cloned();
        self.requests.lock().unwrap().push(request);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        match behavior {
            None => Ok(AgentOutput::new(default_output(&agent_id))),
            Some(Behavior::Succeed(value)) => Ok(AgentOutput::new(value).with_reasoning("scripted")),
            Some(Behavior::Fail(message)) => Err(AgentError::failed(message)),
            Some(Behavior::Sleep(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(AgentOutput::new(default_output(&agent_id)))
            }
            Some(Behavior::Panic(message)) => panic!("{message}"),
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Publisher that keeps every event; optionally fails or panics on each call.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<StatusEvent>>,
    fail: bool,
    panic: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn phases_of(&self, agent_id: &str) -> Vec<AgentPhase> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StatusEvent::Agent {
                    agent_id: id,
                    status,
                    ..
                } if id == agent_id => Some(status),
                _ => None,
            })
            .collect()
    }
}

impl StatusPublisher for RecordingPublisher {
    fn name(&self) -> &str {
        "recording"
    }

    fn publish(&self, event: &StatusEvent) -> Result<(), PublishError> {
        if self.panic {
            panic!("publisher exploded");
        }
        self.events.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(PublishError("subscriber went away".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SavedJob {
    pub job_id: String,
    pub synthesized_output: Value,
    pub execution_log: Vec<ExecutionLogEntry>,
}

#[derive(Default)]
pub struct MemorySink {
    saved: Mutex<Vec<SavedJob>>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<SavedJob> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(
        &self,
        job_id: &str,
        synthesized_output: &Value,
        execution_log: &[ExecutionLogEntry],
    ) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Other("disk full".to_string()));
        }
        self.saved.lock().unwrap().push(SavedJob {
            job_id: job_id.to_string(),
            synthesized_output: synthesized_output.clone(),
            execution_log: execution_log.to_vec(),
        });
        Ok(())
    }
}

/// Provider serving a fixed node list for one playbook name.
pub struct StaticProvider {
    playbook: String,
    nodes: Vec<AgentNode>,
}

impl StaticProvider {
    pub fn new(playbook: &str, nodes: Vec<AgentNode>) -> Self {
        Self {
            playbook: playbook.to_string(),
            nodes,
        }
    }
}

#[async_trait]
impl GraphProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn load(&self, descriptor: &JobDescriptor) -> Result<Graph, ProviderError> {
        if descriptor.playbook != self.playbook {
            return Err(ProviderError::NotFound(descriptor.playbook.clone()));
        }
        Ok(Graph::from_nodes(self.nodes.clone())?)
    }
}

pub fn validated(nodes: Vec<AgentNode>) -> (ValidatedGraph, ExecutionPlan) {
    let graph = Graph::from_nodes(nodes)
        .expect("graph builds")
        .validate()
        .expect("graph is valid");
    let plan = ExecutionPlan::from_graph(&graph);
    (graph, plan)
}

/// Engine builder routing every `custom` agent to `executor`.
pub fn engine_with(executor: Arc<ScriptedExecutor>) -> ExecutionEngineBuilder {
    ExecutionEngine::builder(ExecutorRegistry::new().with("custom", executor))
}

pub fn diamond() -> Vec<AgentNode> {
    vec![
        AgentNode::new("A"),
        AgentNode::new("B").depends_on("A"),
        AgentNode::new("C").depends_on("A"),
        AgentNode::new("D").depends_on("B").depends_on("C"),
    ]
}
