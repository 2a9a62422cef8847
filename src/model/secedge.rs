//! Secondary edges: relations outside the primary tree.

use serde::{Deserialize, Serialize};

use super::{NodeId, Signal};

/// A non-tree relation between two nodes, keyed by `(source, target)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: String,
    pub signals: Vec<Signal>,
}

impl SecondaryEdge {
    pub fn new(source: NodeId, target: NodeId, relation: impl Into<String>) -> Self {
        Self {
            source,
            target,
            relation: relation.into(),
            signals: Vec::new(),
        }
    }

    /// Markup id of the edge: `"source-target"`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.source, self.target)
    }
}
