use std::collections::{BTreeSet, HashMap};
use std::ops::Deref;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Broad category of work an agent performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Ingestion,
    Query,
    Management,
    #[default]
    Custom,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingestion => "ingestion",
            Self::Query => "query",
            Self::Management => "management",
            Self::Custom => "custom",
        }
    }
}

/// One unit of work in a playbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentNode {
    pub agent_id: String,
    /// Human-readable label, used for logs only.
    pub display_name: String,
    /// Key used to resolve the executor that runs this agent.
    pub routing_key: String,
    pub kind: AgentKind,
    pub declared_dependencies: BTreeSet<String>,
    /// Overrides the engine's default agent timeout.
    pub timeout: Option<Duration>,
}

impl AgentNode {
    pub fn new(agent_id: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        Self {
            display_name: agent_id.clone(),
            agent_id,
            routing_key: AgentKind::Custom.as_str().to_string(),
            kind: AgentKind::Custom,
            declared_dependencies: BTreeSet::new(),
            timeout: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Sets the kind and routes the agent to the executor registered under the kind's name.
    pub fn with_kind(mut self, kind: AgentKind) -> Self {
        self.kind = kind;
        self.routing_key = kind.as_str().to_string();
        self
    }

    pub fn with_routing_key(mut self, key: impl Into<String>) -> Self {
        self.routing_key = key.into();
        self
    }

    pub fn depends_on(mut self, agent_id: impl Into<String>) -> Self {
        self.declared_dependencies.insert(agent_id.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// `to` depends on `from`: `to` cannot run until `from` has an outcome.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// Dependency structure for one job.
///
/// Edges may reference agents that are not (yet) part of the graph; those are
/// rejected by [`Graph::validate`], not at insertion time.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: HashMap<String, AgentNode>,
    edges: BTreeSet<Edge>,
    /// to -> froms, in edge insertion order
    dependencies: HashMap<String, Vec<String>>,
    /// from -> tos, in edge insertion order
    dependents: HashMap<String, Vec<String>>,
    insertion_order: Vec<String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = AgentNode>) -> Result<Self, ValidationError> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node)?;
        }
        Ok(graph)
    }

    /// Add a node and one edge per declared dependency.
    ///
    /// Edges added earlier that point at this node become declared dependencies.
    pub fn add_node(&mut self, mut node: AgentNode) -> Result<(), ValidationError> {
        if self.nodes.contains_key(&node.agent_id) {
            return Err(ValidationError::DuplicateAgent(node.agent_id));
        }

        let agent_id = node.agent_id.clone();
        let deps: Vec<String> = node.declared_dependencies.iter().cloned().collect();
        if let Some(existing) = self.dependencies.get(&agent_id) {
            node.declared_dependencies.extend(existing.iter().cloned());
        }

        self.insertion_order.push(agent_id.clone());
        self.nodes.insert(agent_id.clone(), node);

        for dep in deps {
            self.add_edge(dep, agent_id.clone());
        }

        Ok(())
    }

    /// Returns false when the edge was already present.
    ///
    /// A known target node records `from` in its declared dependencies.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> bool {
        let edge = Edge {
            from: from.into(),
            to: to.into(),
        };
        if self.edges.contains(&edge) {
            return false;
        }

        self.dependencies
            .entry(edge.to.clone())
            .or_default()
            .push(edge.from.clone());
        self.dependents
            .entry(edge.from.clone())
            .or_default()
            .push(edge.to.clone());
        if let Some(node) = self.nodes.get_mut(&edge.to) {
            node.declared_dependencies.insert(edge.from.clone());
        }
        self.edges.insert(edge);
        true
    }

    pub fn node(&self, agent_id: &str) -> Option<&AgentNode> {
        self.nodes.get(agent_id)
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.nodes.contains_key(agent_id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &AgentNode> {
        self.insertion_order
            .iter()
            .filter_map(|id| self.nodes.get(id))
    }

    pub fn agent_ids(&self) -> &[String] {
        &self.insertion_order
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Agents whose output `agent_id` consumes.
    pub fn dependencies_of(&self, agent_id: &str) -> &[String] {
        self.dependencies
            .get(agent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Agents that consume the output of `agent_id`.
    pub fn dependents_of(&self, agent_id: &str) -> &[String] {
        self.dependents
            .get(agent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check the graph and, on success, seal it for planning and execution.
    pub fn validate(self) -> Result<ValidatedGraph, ValidationError> {
        super::validate::validate(&self)?;
        Ok(ValidatedGraph { graph: self })
    }
}

/// A graph that passed validation. Only this type can be planned or executed.
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
    graph: Graph,
}

impl ValidatedGraph {
    pub fn into_inner(self) -> Graph {
        self.graph
    }
}

impl Deref for ValidatedGraph {
    type Target = Graph;

    fn deref(&self) -> &Graph {
        &self.graph
    }
}
