//! # Head Projection
//!
//! Constituent tree → dependency graph.
//!
//! | Phase | Where |
//! |-------|-------|
//! | Resolve each leaf's relation through span pass-throughs | [`head::leaf_relation`] |
//! | Find each leaf's head | [`head::find_dep_head`] |
//! | `chain` / `hirao` rewrites | [`algorithm`] |
//! | `dist` and secondary-edge heights | this module |

pub mod algorithm;
pub mod head;

use hashbrown::{HashMap, HashSet};

use crate::config::{ConvertConfig, HeadAlgorithm};
use crate::features::{self, FeatureProvider};
use crate::model::{NodeId, Relation, RstTree, Signal};
use crate::rsd::{DepGraph, DepRecord, DepSecedge};
use crate::{Error, Result};

/// Head, relation and signals of one leaf while projecting.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// 0 for the graph root.
    pub head: u32,
    /// `None` for the root relation.
    pub relation: Option<Relation>,
    pub signals: Vec<Signal>,
}

/// Projects `tree` onto one dependency record per leaf.
pub fn project(
    tree: &RstTree,
    config: &ConvertConfig,
    provider: Option<&dyn FeatureProvider>,
) -> Result<DepGraph> {
    let mut assignments = Vec::with_capacity(tree.leaf_count());
    for leaf in tree.leaves() {
        let resolved = head::leaf_relation(tree, leaf.id);
        let head = head::find_dep_head(tree, leaf.id);
        let assignment = match head {
            Some(head) => Assignment {
                head: head.0,
                relation: resolved.relation,
                signals: resolved.signals,
            },
            None => Assignment {
                head: 0,
                relation: None,
                signals: resolved.signals,
            },
        };
        tracing::trace!(
            leaf = %leaf.id,
            head = assignment.head,
            relation = ?assignment.relation.as_ref().map(Relation::tagged),
            "assigned head"
        );
        assignments.push(assignment);
    }

    match config.algorithm {
        HeadAlgorithm::Li => {}
        HeadAlgorithm::Chain => algorithm::chain(tree, &mut assignments, config.keep_same_unit),
        HeadAlgorithm::Hirao => algorithm::hirao(&mut assignments, config.keep_same_unit)?,
    }

    let secedges = secondary_edges(tree)?;

    let mut records = Vec::with_capacity(assignments.len());
    for (leaf, assignment) in tree.leaves().iter().zip(assignments) {
        let dist = match (&assignment.relation, assignment.head) {
            (Some(relation), head) if head != 0 => {
                distance(tree, leaf.id, NodeId(head), relation.is_multinuc())
            }
            _ => 0,
        };
        let mut record = DepRecord::new(
            leaf.id.0,
            leaf.text(),
            assignment.head,
            assignment.relation,
        );
        record.dist = dist;
        record.signals = assignment.signals;
        if config.node_ids {
            record.node_id = leaf.source_id.clone();
        }
        if let Some(provider) = provider {
            record.features = features::render(&provider.features(leaf.id.0, leaf.text()));
        }
        record.secedges = secedges.get(&leaf.id).cloned().unwrap_or_default();
        records.push(record);
    }

    tracing::debug!(
        records = records.len(),
        algorithm = %config.algorithm,
        roots = records.iter().filter(|r| r.head == 0).count(),
        "projected dependency graph"
    );
    Ok(DepGraph::new(records))
}

/// Number of structural levels between a leaf's attachment point and its
/// head, used to stack siblings back in order when rebuilding the tree.
///
/// 0 when the head is a direct ancestor. Otherwise the count of steps from
/// the head up to the first common ancestor, one less when that ancestor is
/// a multinuc and the edge is a multinuc edge.
fn distance(tree: &RstTree, leaf: NodeId, head: NodeId, multinuc_edge: bool) -> u32 {
    let mut encountered: HashSet<NodeId> = HashSet::new();
    for ancestor in tree.ancestors(leaf) {
        if ancestor.id == head {
            return 0;
        }
        encountered.insert(ancestor.id);
    }
    let mut dist = 1;
    for ancestor in tree.ancestors(head) {
        if encountered.contains(&ancestor.id) {
            if ancestor.is_multinuc() && multinuc_edge {
                dist -= 1;
            }
            return dist;
        }
        dist += 1;
    }
    dist
}

/// Representative leaf and height of every node.
///
/// A node is represented by the lowest-id leaf that reaches it without
/// passing through another leaf; the height is the number of steps from
/// that leaf up to the node.
pub(crate) fn representatives(tree: &RstTree) -> HashMap<NodeId, (NodeId, u32)> {
    let mut reps: HashMap<NodeId, (NodeId, u32)> = HashMap::new();
    for leaf in tree.leaves() {
        let (mut rep, mut height) = (leaf.id, 0);
        reps.entry(leaf.id).or_insert((leaf.id, 0));
        for ancestor in tree.ancestors(leaf.id) {
            if ancestor.is_leaf() {
                (rep, height) = (ancestor.id, 0);
            } else {
                height += 1;
            }
            let entry = reps.entry(ancestor.id).or_insert((rep, height));
            if rep < entry.0 {
                *entry = (rep, height);
            }
        }
    }
    reps
}

/// Secondary edges re-anchored on representative leaves, grouped by
/// source leaf.
fn secondary_edges(tree: &RstTree) -> Result<HashMap<NodeId, Vec<DepSecedge>>> {
    let mut out: HashMap<NodeId, Vec<DepSecedge>> = HashMap::new();
    if tree.secedges.is_empty() {
        return Ok(out);
    }
    let reps = representatives(tree);
    let lookup = |id: NodeId, edge: &str| {
        reps.get(&id).copied().ok_or_else(|| Error::UnknownNode {
            id: id.to_string(),
            context: format!("endpoint of secondary edge {edge} is detached from every leaf"),
        })
    };
    for edge in &tree.secedges {
        let key = edge.key();
        let (source, source_height) = lookup(edge.source, &key)?;
        let (target, target_height) = lookup(edge.target, &key)?;
        out.entry(source).or_default().push(DepSecedge {
            target: target.0,
            relation: edge.relation.clone(),
            source_height,
            target_height,
            signals: edge.signals.clone(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, RelationTable, SecondaryEdge};

    fn attach(tree: &mut RstTree, child: u32, parent: u32, rel: Relation) {
        tree[NodeId(child)].parent = Some(NodeId(parent));
        tree[NodeId(child)].relation = Some(rel);
    }

    /// span 5 { 1 -elab-> [multinuc 4 { 2, 3 }] } with 1 as nucleus:
    /// leaf 1 span-> 5, multinuc 4 elab-> 5.
    fn satellite_multinuc() -> RstTree {
        let mut tree = RstTree::new(RelationTable::new());
        for t in ["a", "b", "c"] {
            tree.push_leaf(t).unwrap();
        }
        tree.push_group(NodeKind::Multinuc);
        tree.push_group(NodeKind::Span);
        attach(&mut tree, 1, 5, Relation::span());
        attach(&mut tree, 4, 5, Relation::satellite("elaboration"));
        attach(&mut tree, 2, 4, Relation::multinuc("joint"));
        attach(&mut tree, 3, 4, Relation::multinuc("joint"));
        tree.finalize().unwrap();
        tree
    }

    #[test]
    fn satellite_multinuc_hangs_off_the_nucleus() {
        let tree = satellite_multinuc();
        let graph = project(&tree, &ConvertConfig::default(), None).unwrap();
        let rows: Vec<_> = graph
            .iter()
            .map(|r| (r.id, r.head, r.relation_label(), r.dist))
            .collect();
        assert_eq!(
            rows,
            vec![
                (1, 0, "ROOT".to_string(), 0),
                (2, 1, "elaboration_r".to_string(), 1),
                (3, 2, "joint_m".to_string(), 0),
            ]
        );
    }

    #[test]
    fn representatives_reset_at_leaves() {
        let tree = satellite_multinuc();
        let reps = representatives(&tree);
        assert_eq!(reps[&NodeId(4)], (NodeId(2), 1));
        assert_eq!(reps[&NodeId(5)], (NodeId(1), 1));
        assert_eq!(reps[&NodeId(3)], (NodeId(3), 0));
    }

    #[test]
    fn secondary_edges_land_on_representatives() {
        let mut tree = satellite_multinuc();
        tree.secedges.push(SecondaryEdge::new(NodeId(3), NodeId(4), "restatement"));
        let graph = project(&tree, &ConvertConfig::default(), None).unwrap();
        let edge = &graph.records[2].secedges[0];
        assert_eq!((edge.target, edge.source_height, edge.target_height), (2, 0, 1));
    }

    #[test]
    fn node_ids_and_features_fill_their_columns() {
        let mut tree = satellite_multinuc();
        tree[NodeId(1)].source_id = Some("s1".to_string());
        let config = ConvertConfig {
            node_ids: true,
            ..ConvertConfig::default()
        };
        let provider = |id: u32, _: &str| vec![("len".to_string(), id.to_string())];
        let graph = project(&tree, &config, Some(&provider)).unwrap();
        assert_eq!(graph.records[0].node_id.as_deref(), Some("s1"));
        assert_eq!(graph.records[1].features.as_deref(), Some("len=2"));
    }
}
