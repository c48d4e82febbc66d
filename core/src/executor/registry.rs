use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::graph::Graph;

use super::traits::AgentExecutor;

/// Routing key -> executor table, filled at construction time.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    handlers: HashMap<String, Arc<dyn AgentExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the executor for a routing key.
    pub fn register(&mut self, routing_key: impl Into<String>, executor: Arc<dyn AgentExecutor>) {
        self.handlers.insert(routing_key.into(), executor);
    }

    pub fn with(mut self, routing_key: impl Into<String>, executor: Arc<dyn AgentExecutor>) -> Self {
        self.register(routing_key, executor);
        self
    }

    pub fn get(&self, routing_key: &str) -> Option<Arc<dyn AgentExecutor>> {
        self.handlers.get(routing_key).cloned()
    }

    pub fn routing_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Resolve the executor of every agent, agent_id -> executor.
    ///
    /// Fails on the first agent (in insertion order) whose routing key is unknown.
    pub fn resolve(
        &self,
        graph: &Graph,
    ) -> Result<HashMap<String, Arc<dyn AgentExecutor>>, ConfigurationError> {
        let mut resolved = HashMap::with_capacity(graph.len());
        for node in graph.nodes() {
            let executor = self.get(&node.routing_key).ok_or_else(|| {
                ConfigurationError::UnknownRoutingKey {
                    agent_id: node.agent_id.clone(),
                    routing_key: node.routing_key.clone(),
                }
            })?;
            resolved.insert(node.agent_id.clone(), executor);
        }
        Ok(resolved)
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("routing_keys", &self.routing_keys())
            .finish()
    }
}
