//! Deterministic numbering of internal nodes.
//!
//! Leaves keep their ids. Groups are numbered from `leaf_count + 1` in the
//! order a leaf-by-leaf climb first meets them, which makes the numbering a
//! function of the tree's shape alone.

use crate::model::{NodeId, RstTree, SecondaryEdge};
use crate::{Error, Result};

/// Renumbers the groups of `tree` and re-derives every structural field.
/// Groups that no leaf reaches are dropped.
pub fn canonicalize(tree: RstTree) -> Result<RstTree> {
    tree.check_links()?;
    let leaf_count = tree.leaf_count();
    let mut map: Vec<Option<NodeId>> = vec![None; tree.len()];
    for leaf in tree.leaves() {
        map[leaf.id.index()] = Some(leaf.id);
    }
    let mut next = leaf_count;
    for leaf in tree.leaves() {
        for ancestor in tree.ancestors(leaf.id) {
            let slot = &mut map[ancestor.id.index()];
            if slot.is_none() {
                next += 1;
                *slot = Some(NodeId::from_index(next - 1));
            }
        }
    }

    let dropped = map.iter().filter(|m| m.is_none()).count();
    if dropped > 0 {
        let signals: usize = tree
            .nodes()
            .iter()
            .filter(|n| map[n.id.index()].is_none())
            .map(|n| n.signals.len())
            .sum();
        tracing::warn!(dropped, signals, "dropping groups that cover no leaf");
    }

    let (nodes, _, secedges, relations) = tree.into_parts();
    let mut renumbered = Vec::with_capacity(next);
    for mut node in nodes {
        let Some(id) = map[node.id.index()] else { continue };
        node.id = id;
        node.parent = node.parent.and_then(|p| map[p.index()]);
        renumbered.push(node);
    }
    renumbered.sort_by_key(|n| n.id);

    let mut edges: Vec<SecondaryEdge> = Vec::with_capacity(secedges.len());
    for mut edge in secedges {
        match (remap(&map, edge.source), remap(&map, edge.target)) {
            (Some(source), Some(target)) => {
                edge.source = source;
                edge.target = target;
                edges.push(edge);
            }
            _ => tracing::warn!(edge = %edge.key(), "dropping secondary edge on a dropped group"),
        }
    }

    let mut tree = RstTree::from_parts(renumbered, leaf_count, edges, relations);
    tree.finalize()?;
    if tree.len() != next {
        return Err(Error::Corrupt(format!(
            "renumbering produced {} nodes, expected {next}",
            tree.len()
        )));
    }
    tracing::debug!(nodes = tree.len(), "canonicalized node ids");
    Ok(tree)
}

fn remap(map: &[Option<NodeId>], id: NodeId) -> Option<NodeId> {
    map.get(id.index()).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, Relation, RelationTable, Signal};

    #[test]
    fn groups_are_numbered_by_first_leaf_climb() {
        // Groups pushed in reverse of their climb order, plus an orphan.
        let mut tree = RstTree::new(RelationTable::new());
        tree.push_leaf("a").unwrap();
        tree.push_leaf("b").unwrap();
        let orphan = tree.push_group(NodeKind::Span);
        let outer = tree.push_group(NodeKind::Span);
        let inner = tree.push_group(NodeKind::Multinuc);
        for leaf in [NodeId(1), NodeId(2)] {
            tree[leaf].parent = Some(inner);
            tree[leaf].relation = Some(Relation::multinuc("joint"));
        }
        tree[inner].parent = Some(outer);
        tree[inner].relation = Some(Relation::span());
        tree.secedges.push(SecondaryEdge::new(NodeId(2), inner, "joint"));
        tree.secedges.push(SecondaryEdge::new(NodeId(1), orphan, "joint"));
        tree[orphan]
            .signals
            .push(Signal::new("dm", "dm", Default::default()));
        tree.finalize().unwrap();

        let tree = canonicalize(tree).unwrap();
        assert_eq!(tree.len(), 4);
        assert!(tree[NodeId(3)].is_multinuc());
        assert_eq!(tree[NodeId(3)].parent, Some(NodeId(4)));
        assert_eq!(tree[NodeId(1)].parent, Some(NodeId(3)));
        assert_eq!(tree.secedges.len(), 1);
        assert_eq!(tree.secedges[0].target, NodeId(3));
        assert!(tree.nodes().iter().all(|n| n.signals.is_empty()));
    }
}
