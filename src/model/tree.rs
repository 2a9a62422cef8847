//! The constituent tree arena.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::{Node, NodeId, NodeKind, RelKind, RelationTable, SecondaryEdge};
use crate::{Error, Result};

/// A constituent tree stored as a contiguous arena of nodes.
///
/// Leaves come first (ids `1..=leaf_count`), groups follow. Parent, child
/// and leftmost-child references are arena ids, so every link is a plain
/// index. Secondary edges live beside the tree, never inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RstTree {
    nodes: Vec<Node>,
    leaf_count: usize,
    pub secedges: Vec<SecondaryEdge>,
    pub relations: RelationTable,
}

impl RstTree {
    pub fn new(relations: RelationTable) -> Self {
        Self {
            relations,
            ..Self::default()
        }
    }

    /// Reassembles a tree from parts whose ids already match their
    /// positions.
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        leaf_count: usize,
        secedges: Vec<SecondaryEdge>,
        relations: RelationTable,
    ) -> Self {
        Self {
            nodes,
            leaf_count,
            secedges,
            relations,
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<Node>, usize, Vec<SecondaryEdge>, RelationTable) {
        (self.nodes, self.leaf_count, self.secedges, self.relations)
    }

    /// Appends a leaf. Leaves must all be pushed before the first group.
    pub fn push_leaf(&mut self, text: impl Into<String>) -> Result<NodeId> {
        if self.nodes.len() != self.leaf_count {
            return Err(Error::Corrupt(
                "leaf appended after the first group".to_string(),
            ));
        }
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::leaf(id, text));
        self.leaf_count += 1;
        Ok(id)
    }

    pub fn push_group(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::group(id, kind));
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        id.0.checked_sub(1).and_then(|i| self.nodes.get(i as usize))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn leaves(&self) -> &[Node] {
        &self.nodes[..self.leaf_count]
    }

    pub fn groups(&self) -> &[Node] {
        &self.nodes[self.leaf_count..]
    }

    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.parent.is_none())
    }

    /// Parent chain of `id`, nearest first. Assumes an acyclic tree.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).and_then(|n| n.parent),
        }
    }

    /// Fails with [`Error::UnknownNode`] if any parent reference is
    /// dangling, or [`Error::Cycle`] if a parent chain loops.
    pub fn check_links(&self) -> Result<()> {
        let limit = self.nodes.len();
        for node in &self.nodes {
            let mut steps = 0;
            let mut cursor = node.parent;
            while let Some(parent) = cursor {
                let Some(next) = self.get(parent) else {
                    return Err(Error::UnknownNode {
                        id: parent.to_string(),
                        context: format!("parent of node {}", node.id),
                    });
                };
                steps += 1;
                if steps > limit {
                    return Err(Error::Cycle {
                        node: node.id.0,
                        limit,
                    });
                }
                cursor = next.parent;
            }
        }
        Ok(())
    }

    /// Recomputes every derived field from the parent and relation links:
    /// leaf extents, children, leftmost children and depths.
    pub fn finalize(&mut self) -> Result<()> {
        self.check_links()?;
        self.compute_extents();
        self.link_children();
        self.compute_depths();
        Ok(())
    }

    /// Leaf ranges propagate upward only across span edges and multinuc
    /// edges; the running minimum and maximum are carried past satellite
    /// edges so a nucleus' span also covers its satellites.
    fn compute_extents(&mut self) {
        for node in &mut self.nodes[self.leaf_count..] {
            node.left = 0;
            node.right = 0;
        }
        for leaf in 0..self.leaf_count {
            let (mut min_left, mut max_right) = (0, 0);
            let mut cursor = NodeId::from_index(leaf);
            loop {
                let node = &self[cursor];
                if (min_left == 0 || min_left > node.left) && node.left != 0 {
                    min_left = node.left;
                }
                if max_right == 0 || max_right < node.right {
                    max_right = node.right;
                }
                let Some(parent_id) = node.parent else { break };
                let extends = matches!(node.rel_kind(), Some(RelKind::Span | RelKind::Multinuc));
                let parent = &mut self[parent_id];
                if extends && !parent.is_leaf() {
                    if parent.left == 0 || parent.left > min_left {
                        parent.left = min_left;
                    }
                    if parent.right < max_right {
                        parent.right = max_right;
                    }
                }
                cursor = parent_id;
            }
        }
    }

    fn link_children(&mut self) {
        for node in &mut self.nodes {
            node.children.clear();
            node.leftmost_child = None;
        }
        for i in 0..self.nodes.len() {
            let (id, left) = (self.nodes[i].id, self.nodes[i].left);
            let Some(parent_id) = self.nodes[i].parent else { continue };
            let parent = &mut self[parent_id];
            parent.children.push(id);
            if left == parent.left {
                parent.leftmost_child = Some(id);
            }
        }
        for i in self.leaf_count..self.nodes.len() {
            if !self.nodes[i].is_multinuc() || self.nodes[i].leftmost_child.is_some() {
                continue;
            }
            let fallback = self.nodes[i]
                .children
                .iter()
                .map(|&c| &self[c])
                .filter(|c| c.has_multinuc_relation())
                .min_by_key(|c| (c.left, c.id))
                .map(|c| c.id);
            self.nodes[i].leftmost_child = fallback;
        }
    }

    fn compute_depths(&mut self) {
        for i in 0..self.nodes.len() {
            let mut depth = 0;
            let mut cursor = &self.nodes[i];
            while let Some(parent_id) = cursor.parent {
                let parent = &self[parent_id];
                let counts = cursor.has_span_relation()
                    || (parent.is_multinuc() && cursor.has_multinuc_relation());
                if !parent.is_leaf() && counts {
                    depth += 1;
                }
                cursor = parent;
            }
            self.nodes[i].depth = depth;
        }
    }

    /// The leaf that represents `id`: a span is represented through its
    /// span-labeled child, a multinuc through its leftmost child.
    pub fn head_leaf(&self, id: NodeId) -> NodeId {
        let mut cursor = id;
        for _ in 0..=self.nodes.len() {
            let node = &self[cursor];
            let next = match node.kind {
                NodeKind::Leaf { .. } => return cursor,
                NodeKind::Span => node
                    .children
                    .iter()
                    .copied()
                    .find(|&c| self[c].has_span_relation()),
                NodeKind::Multinuc => node.leftmost_child,
            };
            match next.or_else(|| node.children.first().copied()) {
                Some(next) => cursor = next,
                None => return cursor,
            }
        }
        cursor
    }
}

impl Index<NodeId> for RstTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for RstTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

/// Iterator over a node's ancestors, see [`RstTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a RstTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.tree.get(self.next?)?;
        self.next = node.parent;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Relation;

    /// 1 <-elab- 2, both under a span 3 whose nucleus is 2.
    fn satellite_tree() -> RstTree {
        let mut tree = RstTree::new(RelationTable::new());
        let a = tree.push_leaf("a").unwrap();
        let b = tree.push_leaf("b").unwrap();
        let span = tree.push_group(NodeKind::Span);
        tree[a].parent = Some(span);
        tree[a].relation = Some(Relation::satellite("elaboration"));
        tree[b].parent = Some(span);
        tree[b].relation = Some(Relation::span());
        tree.finalize().unwrap();
        tree
    }

    #[test]
    fn satellite_edges_do_not_extend_the_parent() {
        let tree = satellite_tree();
        let span = &tree[NodeId(3)];
        assert_eq!((span.left, span.right), (2, 2));
        assert_eq!(span.children.as_slice(), &[NodeId(1), NodeId(2)]);
        assert_eq!(span.leftmost_child, Some(NodeId(2)));
        assert_eq!(tree[NodeId(1)].depth, 0);
        assert_eq!(tree[NodeId(2)].depth, 1);
    }

    #[test]
    fn multinuc_extents_and_leftmost_child() {
        let mut tree = RstTree::new(RelationTable::new());
        for t in ["a", "b", "c"] {
            tree.push_leaf(t).unwrap();
        }
        let multi = tree.push_group(NodeKind::Multinuc);
        for leaf in 1..=3 {
            tree[NodeId(leaf)].parent = Some(multi);
            tree[NodeId(leaf)].relation = Some(Relation::multinuc("joint"));
        }
        tree.finalize().unwrap();
        let node = &tree[multi];
        assert_eq!((node.left, node.right), (1, 3));
        assert_eq!(node.leftmost_child, Some(NodeId(1)));
        assert_eq!(tree.head_leaf(multi), NodeId(1));
        assert!(tree.leaves().iter().all(|l| l.depth == 1));
    }

    #[test]
    fn parent_cycles_are_reported() {
        let mut tree = satellite_tree();
        tree[NodeId(3)].parent = Some(NodeId(2));
        tree[NodeId(3)].relation = Some(Relation::span());
        assert!(matches!(tree.finalize(), Err(Error::Cycle { .. })));
    }

    #[test]
    fn dangling_parents_are_reported() {
        let mut tree = satellite_tree();
        tree[NodeId(3)].parent = Some(NodeId(9));
        assert!(matches!(tree.finalize(), Err(Error::UnknownNode { .. })));
    }

    #[test]
    fn leaves_must_precede_groups() {
        let mut tree = RstTree::new(RelationTable::new());
        tree.push_leaf("a").unwrap();
        tree.push_group(NodeKind::Span);
        assert!(tree.push_leaf("b").is_err());
    }

    #[test]
    fn ancestors_walk_to_the_root() {
        let tree = satellite_tree();
        let chain: Vec<_> = tree.ancestors(NodeId(1)).map(|n| n.id).collect();
        assert_eq!(chain, vec![NodeId(3)]);
        assert_eq!(tree.roots().count(), 1);
    }
}
