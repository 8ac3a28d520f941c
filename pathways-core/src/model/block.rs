//! Knowledge block decision trees
//!
//! A block is a nested mapping. Each node may carry a `question`, a list of
//! `options`, `paths` from an option to a child node, `resources` and a
//! `summary`. The top level uses `initial_question` in place of `question`.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::{field, key_label};

/// Top-level fields every knowledge block must declare
pub const REQUIRED_FIELDS: &[&str] = &["id", "title", "initial_question", "paths", "metadata"];

/// Fields required inside `metadata`
pub const REQUIRED_METADATA_FIELDS: &[&str] = &["author"];

/// Child nodes of `node`, keyed by their option label, in document order.
pub fn children(node: &Value) -> Vec<(String, &Value)> {
    field(node, "paths")
        .and_then(Value::as_mapping)
        .map(|paths| paths.iter().map(|(k, v)| (key_label(k), v)).collect())
        .unwrap_or_default()
}

/// A node with neither `paths` nor `question` ends the flow.
pub fn is_leaf(node: &Value) -> bool {
    field(node, "paths").is_none() && field(node, "question").is_none()
}

/// Resource references declared directly on `node`.
pub fn resources(node: &Value) -> Vec<&str> {
    field(node, "resources")
        .and_then(Value::as_sequence)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Shape of a decision tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    /// Nodes below the root
    pub nodes: usize,
    /// Terminal nodes
    pub leaves: usize,
    /// Longest path from the root
    pub max_depth: usize,
    /// Resource references across the tree
    pub resources: usize,
}

impl TreeStats {
    /// Measure the tree rooted at a block document.
    pub fn of(block: &Value) -> Self {
        let mut stats = Self {
            resources: resources(block).len(),
            ..Self::default()
        };
        let mut stack: Vec<(&Value, usize)> = children(block).into_iter().map(|(_, c)| (c, 1)).collect();

        while let Some((node, depth)) = stack.pop() {
            stats.nodes += 1;
            stats.max_depth = stats.max_depth.max(depth);
            stats.resources += resources(node).len();
            if is_leaf(node) {
                stats.leaves += 1;
            }
            stack.extend(children(node).into_iter().map(|(_, c)| (c, depth + 1)));
        }

        stats
    }
}

impl std::ops::AddAssign for TreeStats {
    fn add_assign(&mut self, other: Self) {
        self.nodes += other.nodes;
        self.leaves += other.leaves;
        self.max_depth = self.max_depth.max(other.max_depth);
        self.resources += other.resources;
    }
}
