use serde_json::{Map, Value};

use crate::executor::types::JobResult;
use crate::graph::ValidatedGraph;

/// Builds the synthesized output handed to the result sink.
pub trait Synthesizer: Send + Sync {
    fn synthesize(&self, graph: &ValidatedGraph, result: &JobResult) -> Value;
}

/// Collects the outputs of terminal agents (no dependents), keyed by agent id.
///
/// Terminal agents without an output (failed or skipped) map to `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeafOutputSynthesizer;

impl Synthesizer for LeafOutputSynthesizer {
    fn synthesize(&self, graph: &ValidatedGraph, result: &JobResult) -> Value {
        let mut out = Map::new();
        for node in graph.nodes() {
            if !graph.dependents_of(&node.agent_id).is_empty() {
                continue;
            }
            let output = result
                .entry(&node.agent_id)
                .and_then(|e| e.output.clone())
                .unwrap_or(Value::Null);
            out.insert(node.agent_id.clone(), output);
        }
        Value::Object(out)
    }
}
