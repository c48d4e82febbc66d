use std::collections::HashMap;

use serde::Serialize;

use super::model::ValidatedGraph;

/// Ordered execution levels derived from a validated graph.
///
/// Agents in the same level have no dependency relationship and may run
/// concurrently. Every edge points from a lower level to a higher one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    levels: Vec<Vec<String>>,
    #[serde(skip)]
    level_index: HashMap<String, usize>,
}

impl ExecutionPlan {
    /// Topological sort using Kahn's algorithm
    ///
    /// # Algorithm
    ///
    /// 1. Calculate in-degree for all nodes
    /// 2. Find all nodes with in-degree 0 (first level)
    /// 3. Remove these nodes and update in-degrees
    /// 4. Repeat until all nodes processed
    ///
    /// Within a level agents are sorted by id so logs are deterministic.
    ///
    /// # Time Complexity
    ///
    /// O(V log V + E) where V = number of agents, E = number of edges
    pub fn from_graph(graph: &ValidatedGraph) -> Self {
        let mut in_degree: HashMap<&str, usize> = graph
            .agent_ids()
            .iter()
            .map(|id| (id.as_str(), graph.dependencies_of(id).len()))
            .collect();

        let mut current: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut level_index = HashMap::with_capacity(graph.len());

        while !current.is_empty() {
            current.sort_unstable();

            let mut next = Vec::new();
            for id in &current {
                for dependent in graph.dependents_of(id) {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(dependent.as_str());
                        }
                    }
                }
            }

            let level_no = levels.len();
            for id in &current {
                level_index.insert((*id).to_string(), level_no);
            }
            levels.push(current.iter().map(|id| id.to_string()).collect());
            current = next;
        }

        debug_assert_eq!(
            level_index.len(),
            graph.len(),
            "validated graph must be acyclic"
        );

        Self {
            levels,
            level_index,
        }
    }

    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    pub fn level_index(&self, agent_id: &str) -> Option<usize> {
        self.level_index.get(agent_id).copied()
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn total_agents(&self) -> usize {
        self.level_index.len()
    }

    /// All agents in plan order.
    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().flatten().map(String::as_str)
    }
}

/// Compute the execution plan for a validated graph.
pub fn plan(graph: &ValidatedGraph) -> ExecutionPlan {
    ExecutionPlan::from_graph(graph)
}
