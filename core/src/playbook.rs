//! Declarative playbook format (TOML or JSON) and its conversion to a [`Graph`].
//!
//! ```toml
//! name = "incident-triage"
//!
//! [[agents]]
//! id = "entity"
//! kind = "ingestion"
//!
//! [[agents]]
//! id = "severity"
//! kind = "query"
//! executor = "severity-model"
//! depends_on = ["entity"]
//! timeout_ms = 30000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ValidationError};
use crate::graph::{AgentKind, AgentNode, Graph};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playbook {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub agents: Vec<AgentSpec>,

    /// Extra `(from, to)` edges on top of each agent's `depends_on`.
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub kind: AgentKind,

    /// Routing key; defaults to the kind name.
    #[serde(default)]
    pub executor: Option<String>,

    #[serde(default, alias = "dependencies")]
    pub depends_on: Vec<String>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybookFormat {
    Toml,
    Json,
}

impl PlaybookFormat {
    pub fn from_path(path: &Path) -> Result<Self, ProviderError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            other => Err(ProviderError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

impl Playbook {
    pub fn parse(input: &str, format: PlaybookFormat) -> Result<Self, ProviderError> {
        let playbook: Playbook = match format {
            PlaybookFormat::Toml => {
                toml::from_str(input).map_err(|e| ProviderError::Malformed(e.to_string()))?
            }
            PlaybookFormat::Json => serde_json::from_str(input)
                .map_err(|e| ProviderError::Malformed(e.to_string()))?,
        };
        playbook.check_ids()?;
        Ok(playbook)
    }

    fn check_ids(&self) -> Result<(), ProviderError> {
        for agent in &self.agents {
            if agent.id.trim().is_empty() {
                return Err(ProviderError::Malformed(format!(
                    "playbook '{}' contains an agent with an empty id",
                    self.name
                )));
            }
            if let Some(dep) = agent.depends_on.iter().find(|d| d.trim().is_empty()) {
                return Err(ProviderError::Malformed(format!(
                    "agent '{}' has an empty dependency id ({dep:?})",
                    agent.id
                )));
            }
        }
        Ok(())
    }

    /// Build the unvalidated graph. Only duplicate ids are rejected here.
    pub fn to_graph(&self) -> Result<Graph, ValidationError> {
        let mut graph = Graph::new();

        for spec in &self.agents {
            let mut node = AgentNode::new(spec.id.clone()).with_kind(spec.kind);
            if let Some(name) = &spec.name {
                node = node.with_display_name(name.clone());
            }
            if let Some(key) = &spec.executor {
                node = node.with_routing_key(key.clone());
            }
            if let Some(ms) = spec.timeout_ms {
                node = node.with_timeout(Duration::from_millis(ms));
            }
            for dep in &spec.depends_on {
                node = node.depends_on(dep.clone());
            }
            graph.add_node(node)?;
        }

        for (from, to) in &self.edges {
            graph.add_edge(from.clone(), to.clone());
        }

        Ok(graph)
    }
}
