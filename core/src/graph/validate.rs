use std::collections::HashMap;

use crate::error::ValidationError;

use super::model::Graph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not visited yet
    White,
    /// On the current DFS path
    Gray,
    /// Fully explored
    Black,
}

/// Validate dependency relationships.
///
/// Checks, in order: unknown edge endpoints, self-dependencies, cycles.
/// Read-only; the first problem found is returned.
pub fn validate(graph: &Graph) -> Result<(), ValidationError> {
    check_references(graph)?;
    check_self_dependencies(graph)?;

    if let Some(path) = detect_cycle(graph) {
        return Err(ValidationError::Cycle { path });
    }

    Ok(())
}

fn check_references(graph: &Graph) -> Result<(), ValidationError> {
    for edge in graph.edges() {
        if !graph.contains(&edge.from) {
            return Err(ValidationError::UnknownNode {
                missing: edge.from.clone(),
                referenced_by: edge.to.clone(),
            });
        }
        if !graph.contains(&edge.to) {
            return Err(ValidationError::UnknownNode {
                missing: edge.to.clone(),
                referenced_by: edge.from.clone(),
            });
        }
    }
    Ok(())
}

fn check_self_dependencies(graph: &Graph) -> Result<(), ValidationError> {
    match graph.edges().find(|edge| edge.from == edge.to) {
        Some(edge) => Err(ValidationError::SelfDependency(edge.from.clone())),
        None => Ok(()),
    }
}

/// Detect a cycle with an iterative three-color DFS along dependency -> dependent edges.
///
/// Returns the cycle path with its first node repeated at the end, e.g. `[x, y, x]`.
///
/// # Time Complexity
///
/// O(V + E) where V = number of agents, E = number of edges
fn detect_cycle(graph: &Graph) -> Option<Vec<String>> {
    let ids = graph.agent_ids();
    let index: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    // Only called after reference checks, so every dependent resolves.
    let adjacency: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| {
            graph
                .dependents_of(id)
                .iter()
                .filter_map(|dependent| index.get(dependent.as_str()).copied())
                .collect()
        })
        .collect();

    let mut color = vec![Color::White; ids.len()];
    // Each frame is (node, index of the next child to explore).
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start in 0..ids.len() {
        if color[start] != Color::White {
            continue;
        }

        color[start] = Color::Gray;
        stack.push((start, 0));

        while let Some(&(node, next)) = stack.last() {
            let Some(&child) = adjacency[node].get(next) else {
                color[node] = Color::Black;
                stack.pop();
                continue;
            };

            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            match color[child] {
                Color::White => {
                    color[child] = Color::Gray;
                    stack.push((child, 0));
                }
                Color::Gray => {
                    let pos = stack
                        .iter()
                        .position(|&(n, _)| n == child)
                        .unwrap_or(0);
                    let mut path: Vec<String> =
                        stack[pos..].iter().map(|&(n, _)| ids[n].clone()).collect();
                    path.push(ids[child].clone());
                    return Some(path);
                }
                Color::Black => {}
            }
        }
    }

    None
}
