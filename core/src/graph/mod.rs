//! Agent dependency graph: model, validation and level planning.
//!
//! ```text
//! Vec<AgentNode>
//!   ↓
//! Graph::from_nodes()
//!   ↓
//! Graph::validate() → unknown references, self-loops, cycles
//!   ↓
//! ValidatedGraph
//!   ↓
//! ExecutionPlan::from_graph() → levels: Vec<Vec<String>>
//! ```

mod model;
mod plan;
mod validate;

pub use model::{AgentKind, AgentNode, Edge, Graph, ValidatedGraph};
pub use plan::{plan, ExecutionPlan};
pub use validate::validate;
