//! Head search over the constituent tree.
//!
//! For a leaf, climb to its parent and look among the parent's other
//! children for a leaf that represents them: spans are entered only along
//! span edges, multinucs only through their leftmost child. Climb further
//! while nothing qualifies. A leaf that reaches the root without finding a
//! representative heads the graph.

use hashbrown::HashSet;

use crate::model::{NodeId, Relation, RstTree, Signal};

/// Relation and signals a leaf carries into the dependency graph, before
/// head search.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafRelation {
    /// `None` for the root relation.
    pub relation: Option<Relation>,
    pub signals: Vec<Signal>,
}

/// Resolves a leaf's relation to the nearest edge that is not a span
/// pass-through. Signals anchored on that edge travel with it; a leaf keeps
/// its own when the edge carries none. When both carry signals the leaf's
/// own are dropped with a warning, since one rsd column cannot hold both.
pub fn leaf_relation(tree: &RstTree, leaf: NodeId) -> LeafRelation {
    let node = &tree[leaf];
    let own = || LeafRelation {
        relation: node.relation.clone(),
        signals: node.signals.clone(),
    };
    let Some(parent) = node.parent else {
        return LeafRelation {
            relation: None,
            signals: node.signals.clone(),
        };
    };
    if !node.has_span_relation() && !is_leftmost_member(tree, leaf, parent) {
        return own();
    }
    match nonspan_anchor(tree, leaf) {
        None => LeafRelation {
            relation: None,
            signals: node.signals.clone(),
        },
        Some(anchor_id) => {
            let anchor = &tree[anchor_id];
            let signals = if anchor.signals.is_empty() {
                node.signals.clone()
            } else {
                if !node.signals.is_empty() {
                    let dropped: Vec<String> = node.signals.iter().map(Signal::to_rsd).collect();
                    tracing::warn!(
                        leaf = %leaf,
                        anchor = %anchor_id,
                        dropped = %dropped.join(";"),
                        "pass-through signals replaced by the anchor edge's signals"
                    );
                }
                anchor.signals.clone()
            };
            LeafRelation {
                relation: anchor.relation.clone(),
                signals,
            }
        }
    }
}

fn is_leftmost_member(tree: &RstTree, node: NodeId, parent: NodeId) -> bool {
    let parent = &tree[parent];
    parent.is_multinuc() && parent.leftmost_child == Some(node)
}

/// Nearest node at or above `start` whose incoming edge is meaningful:
/// neither a span edge nor the edge of a multinuc's leftmost member.
/// `None` if the climb reaches the root.
fn nonspan_anchor(tree: &RstTree, start: NodeId) -> Option<NodeId> {
    let mut cursor = start;
    loop {
        let node = &tree[cursor];
        let parent = node.parent?;
        if node.has_span_relation() || is_leftmost_member(tree, cursor, parent) {
            cursor = parent;
        } else {
            return Some(cursor);
        }
    }
}

/// The leaf `leaf` depends on, or `None` for the graph root.
pub fn find_dep_head(tree: &RstTree, leaf: NodeId) -> Option<NodeId> {
    let exclude = leaf;
    let mut block: HashSet<NodeId> = HashSet::new();
    let mut source = leaf;
    loop {
        let parent_id = tree[source].parent?;
        let parent = &tree[parent_id];
        if parent.is_multinuc() {
            // Members right of `exclude` in the same multinuc cannot head it.
            for &child in &parent.children {
                let left = tree[child].left;
                if left > exclude.0 && left >= parent.left && exclude.0 >= parent.left {
                    block.insert(child);
                }
            }
        }
        if let Some(found) = seek(tree, parent_id, exclude, &block) {
            return Some(found);
        }
        source = parent_id;
    }
}

enum Step {
    Visit(NodeId),
    Take(NodeId),
}

/// Depth-first search below `start` for a representative leaf other than
/// `exclude`.
fn seek(tree: &RstTree, start: NodeId, exclude: NodeId, block: &HashSet<NodeId>) -> Option<NodeId> {
    let excluded_children = &tree[exclude].children;
    let mut stack = vec![Step::Visit(start)];
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Take(id) => return Some(id),
            Step::Visit(id) => id,
        };
        let source = &tree[id];
        if source.is_leaf() && id != exclude && !block.contains(&id) {
            return Some(id);
        }

        let mut candidates: Vec<NodeId> = source
            .children
            .iter()
            .copied()
            .filter(|c| !excluded_children.contains(c) && !block.contains(c))
            .collect();
        if let Some(&first) = candidates.first() {
            if exclude < first {
                candidates.sort_unstable();
            } else {
                candidates.sort_unstable_by(|a, b| b.cmp(a));
            }
        }

        // Pushed in reverse so the first candidate is tried first.
        for &child_id in candidates.iter().rev() {
            if child_id == exclude {
                continue;
            }
            let child = &tree[child_id];
            if child.is_leaf() && source.is_leaf() {
                stack.push(Step::Take(child_id));
            } else if (source.is_span() && child.has_span_relation())
                || (source.is_multinuc() && source.leftmost_child == Some(child_id))
            {
                stack.push(Step::Visit(child_id));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, RelationTable};

    fn attach(tree: &mut RstTree, child: u32, parent: u32, rel: Relation) {
        tree[NodeId(child)].parent = Some(NodeId(parent));
        tree[NodeId(child)].relation = Some(rel);
    }

    /// Leaves 1-3 under multinuc 4 ("joint").
    fn joint() -> RstTree {
        let mut tree = RstTree::new(RelationTable::new());
        for t in ["a", "b", "c"] {
            tree.push_leaf(t).unwrap();
        }
        tree.push_group(NodeKind::Multinuc);
        for leaf in 1..=3 {
            attach(&mut tree, leaf, 4, Relation::multinuc("joint"));
        }
        tree.finalize().unwrap();
        tree
    }

    #[test]
    fn multinuc_members_depend_on_the_leftmost() {
        let tree = joint();
        assert_eq!(find_dep_head(&tree, NodeId(1)), None);
        assert_eq!(find_dep_head(&tree, NodeId(2)), Some(NodeId(1)));
        assert_eq!(find_dep_head(&tree, NodeId(3)), Some(NodeId(1)));
    }

    #[test]
    fn leftmost_member_takes_the_multinuc_relation() {
        let tree = joint();
        assert_eq!(leaf_relation(&tree, NodeId(1)).relation, None);
        assert_eq!(
            leaf_relation(&tree, NodeId(2)).relation,
            Some(Relation::multinuc("joint"))
        );
    }

    #[test]
    fn span_nucleus_inherits_the_span_relation_and_signals() {
        // 1 -elab-> 2 ; span 3 over 2 ; 3 -cause-> 4 ; 4 root.
        let mut tree = RstTree::new(RelationTable::new());
        for t in ["a", "b", "c"] {
            tree.push_leaf(t).unwrap();
        }
        tree.push_group(NodeKind::Span);
        attach(&mut tree, 1, 2, Relation::satellite("elaboration"));
        attach(&mut tree, 2, 4, Relation::span());
        attach(&mut tree, 4, 3, Relation::satellite("cause"));
        tree[NodeId(4)]
            .signals
            .push(Signal::new("dm", "dm", Default::default()));
        tree.finalize().unwrap();

        let rel = leaf_relation(&tree, NodeId(2));
        assert_eq!(rel.relation, Some(Relation::satellite("cause")));
        assert_eq!(rel.signals.len(), 1);
        assert_eq!(find_dep_head(&tree, NodeId(2)), Some(NodeId(3)));
        assert_eq!(find_dep_head(&tree, NodeId(1)), Some(NodeId(2)));
        assert_eq!(find_dep_head(&tree, NodeId(3)), None);
    }

    #[test]
    fn anchor_signals_replace_the_leftmost_members_own() {
        // span 5 over 1 ; multinuc 4 over 2-3 elaborates 1.
        let mut tree = RstTree::new(RelationTable::new());
        for t in ["a", "b", "c"] {
            tree.push_leaf(t).unwrap();
        }
        tree.push_group(NodeKind::Multinuc);
        tree.push_group(NodeKind::Span);
        attach(&mut tree, 1, 5, Relation::span());
        attach(&mut tree, 2, 4, Relation::multinuc("joint"));
        attach(&mut tree, 3, 4, Relation::multinuc("joint"));
        attach(&mut tree, 4, 1, Relation::satellite("elaboration"));
        let dm = Signal::new("dm", "dm", "3".parse().unwrap());
        tree[NodeId(4)].signals.push(dm.clone());
        tree[NodeId(2)]
            .signals
            .push(Signal::new("lexical", "indicative_word", "4".parse().unwrap()));
        tree.finalize().unwrap();

        let rel = leaf_relation(&tree, NodeId(2));
        assert_eq!(rel.relation, Some(Relation::satellite("elaboration")));
        assert_eq!(rel.signals, vec![dm]);

        tree[NodeId(4)].signals.clear();
        assert_eq!(leaf_relation(&tree, NodeId(2)).signals[0].kind, "lexical");
    }
}
