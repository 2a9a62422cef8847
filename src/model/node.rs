//! Nodes of the constituent tree: leaves (EDUs), spans and multinucs.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Signal;

/// Arena address of a node.
///
/// Ids are dense and 1-based: leaves occupy `1..=N` in text order, internal
/// nodes follow. The id doubles as the node's position in [`RstTree`].
///
/// [`RstTree`]: super::RstTree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Zero-based slot in the arena.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn from_index(index: usize) -> Self {
        NodeId(index as u32 + 1)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a node relates to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelKind {
    /// Nucleus-satellite relation (`rst` in the markup, `_r` in rsd).
    Satellite,
    /// Member of a multi-nuclear group (`_m` in rsd).
    Multinuc,
    /// Semantically transparent grouping.
    Span,
}

impl RelKind {
    /// Name used in the markup's relation table.
    pub fn markup_name(self) -> &'static str {
        match self {
            RelKind::Satellite => "rst",
            RelKind::Multinuc => "multinuc",
            RelKind::Span => "span",
        }
    }
}

impl std::fmt::Display for RelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.markup_name())
    }
}

/// A resolved relation on the edge from a node to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub kind: RelKind,
}

impl Relation {
    pub const SPAN: &'static str = "span";

    pub fn new(name: impl Into<String>, kind: RelKind) -> Self {
        Self { name: name.into(), kind }
    }

    pub fn span() -> Self {
        Self::new(Self::SPAN, RelKind::Span)
    }

    pub fn satellite(name: impl Into<String>) -> Self {
        Self::new(name, RelKind::Satellite)
    }

    pub fn multinuc(name: impl Into<String>) -> Self {
        Self::new(name, RelKind::Multinuc)
    }

    pub fn is_span(&self) -> bool {
        self.kind == RelKind::Span
    }

    pub fn is_multinuc(&self) -> bool {
        self.kind == RelKind::Multinuc
    }

    /// True for relations in the same-unit family, which some head
    /// algorithms treat specially.
    pub fn is_same_unit(&self) -> bool {
        self.name.to_lowercase().starts_with("same")
    }

    /// The kind-tagged spelling used by the dependency format:
    /// `name_r`, `name_m`, or plain `span`.
    pub fn tagged(&self) -> String {
        match self.kind {
            RelKind::Satellite => format!("{}_r", self.name),
            RelKind::Multinuc => format!("{}_m", self.name),
            RelKind::Span => Self::SPAN.to_string(),
        }
    }

    /// Inverse of [`Relation::tagged`]. Untagged names other than `span`
    /// are satellite relations.
    pub fn from_tagged(tagged: &str) -> Self {
        if let Some(name) = tagged.strip_suffix("_m") {
            Self::multinuc(name)
        } else if let Some(name) = tagged.strip_suffix("_r") {
            Self::satellite(name)
        } else if tagged == Self::SPAN {
            Self::span()
        } else {
            Self::satellite(tagged)
        }
    }
}

/// Structural kind of a node, with kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Elementary discourse unit.
    Leaf { text: String },
    Span,
    Multinuc,
}

impl NodeKind {
    /// The `type` attribute of a group element (`span` / `multinuc`).
    pub fn group_type(&self) -> Option<&'static str> {
        match self {
            NodeKind::Leaf { .. } => None,
            NodeKind::Span => Some("span"),
            NodeKind::Multinuc => Some("multinuc"),
        }
    }
}

/// A node in the constituent tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Identifier the node carried in its source document, if any.
    pub source_id: Option<String>,
    pub kind: NodeKind,
    /// Inclusive range of leaf ids covered by this node.
    pub left: u32,
    pub right: u32,
    /// `None` for a root.
    pub parent: Option<NodeId>,
    pub depth: u32,
    /// Relation on the edge to `parent`; `None` for a root.
    pub relation: Option<Relation>,
    pub children: SmallVec<[NodeId; 4]>,
    /// Child that represents a multinuc topologically.
    pub leftmost_child: Option<NodeId>,
    /// Signals anchored on the incoming edge.
    pub signals: Vec<Signal>,
}

impl Node {
    pub fn leaf(id: NodeId, text: impl Into<String>) -> Self {
        Self::with_kind(id, NodeKind::Leaf { text: text.into() })
    }

    pub fn group(id: NodeId, kind: NodeKind) -> Self {
        Self::with_kind(id, kind)
    }

    fn with_kind(id: NodeId, kind: NodeKind) -> Self {
        let (left, right) = match kind {
            NodeKind::Leaf { .. } => (id.0, id.0),
            _ => (0, 0),
        };
        Self {
            id,
            source_id: None,
            kind,
            left,
            right,
            parent: None,
            depth: 0,
            relation: None,
            children: SmallVec::new(),
            leftmost_child: None,
            signals: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn is_span(&self) -> bool {
        matches!(self.kind, NodeKind::Span)
    }

    pub fn is_multinuc(&self) -> bool {
        matches!(self.kind, NodeKind::Multinuc)
    }

    /// Text of a leaf; empty for groups.
    pub fn text(&self) -> &str {
        match &self.kind {
            NodeKind::Leaf { text } => text,
            _ => "",
        }
    }

    pub fn rel_kind(&self) -> Option<RelKind> {
        self.relation.as_ref().map(|r| r.kind)
    }

    /// True if the incoming edge is a `span` edge.
    pub fn has_span_relation(&self) -> bool {
        self.relation.as_ref().is_some_and(Relation::is_span)
    }

    pub fn has_multinuc_relation(&self) -> bool {
        self.relation.as_ref().is_some_and(Relation::is_multinuc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_relations_round_trip() {
        for tagged in ["elaboration_r", "joint_m", "span"] {
            assert_eq!(Relation::from_tagged(tagged).tagged(), tagged);
        }
        assert_eq!(Relation::from_tagged("attribution").kind, RelKind::Satellite);
    }

    #[test]
    fn leaf_covers_itself() {
        let leaf = Node::leaf(NodeId(7), "text");
        assert_eq!((leaf.left, leaf.right), (7, 7));
        assert!(leaf.is_leaf());
        assert_eq!(NodeId(7).index(), 6);
        assert_eq!(NodeId::from_index(6), NodeId(7));
    }

    #[test]
    fn same_unit_detection_is_case_insensitive() {
        assert!(Relation::multinuc("Same-Unit").is_same_unit());
        assert!(!Relation::multinuc("joint").is_same_unit());
    }
}
