//! # Tree Reconstruction
//!
//! Dependency graph → constituent tree, the inverse of
//! [`project`](crate::project::project).
//!
//! Leaves are processed from the deepest dependency level up. Each
//! dependent attaches to its head's current top span through a freshly
//! synthesized span, except that a multinuc dependent sharing the `dist` of
//! an earlier sibling joins that sibling's attachment point instead.
//! Multinuc-labeled spans are then promoted to real multinuc groups, and
//! the result is canonicalized.

use std::collections::BTreeSet;

use hashbrown::{HashMap, HashSet};

use crate::canonical::canonicalize;
use crate::config::{ConvertConfig, DepthOrdering, RelationPolicy};
use crate::model::{NodeId, NodeKind, RelKind, Relation, RelationTable, RstTree, SecondaryEdge};
use crate::rsd::{DepGraph, DepRecord};
use crate::{Error, Result};

/// Minimum bound on dependency path length before a cycle is assumed.
pub const MIN_PATH_BOUND: usize = 1000;

pub fn reconstruct(graph: &DepGraph, config: &ConvertConfig) -> Result<RstTree> {
    let records = ordered_records(graph)?;
    let n = records.len();

    let mut relations = match &config.relations {
        RelationPolicy::Collect => RelationTable::new(),
        RelationPolicy::Canonical { table, .. } => table.clone(),
    };
    let mut tree = RstTree::new(RelationTable::new());
    for record in &records {
        let leaf = tree.push_leaf(record.text.clone())?;
        if record.head != 0 {
            if record.head as usize > n {
                return Err(Error::UnknownNode {
                    id: record.head.to_string(),
                    context: format!("head of leaf {}", record.id),
                });
            }
            let relation = match &record.relation {
                Some(relation) => apply_policy(relation, &config.relations, &mut relations)?,
                None => Relation::span(),
            };
            tree[leaf].parent = Some(NodeId(record.head));
            tree[leaf].relation = Some(relation);
        }
        tree[leaf].signals = record.signals.clone();
    }
    tree.relations = relations;

    let depths = path_lengths(&records)?;
    let dists = match config.ordering {
        DepthOrdering::Dist => records.iter().map(|r| r.dist).collect(),
        ordering => reordered_dists(&records, ordering),
    };

    let spans = build_spans(&mut tree, &records, &depths, &dists);
    let promoted = promote_multinucs(&mut tree)?;
    tree.finalize()?;
    tree.secedges = secondary_edges(&tree, &records)?;
    percolate_signals(&mut tree);

    tracing::debug!(leaves = n, spans, promoted, "reconstructed constituent tree");
    canonicalize(tree)
}

/// Records indexed by id; ids must be exactly `1..=n`.
fn ordered_records(graph: &DepGraph) -> Result<Vec<&DepRecord>> {
    if graph.is_empty() {
        return Err(Error::NoSegments);
    }
    let n = graph.len();
    let mut slots: Vec<Option<&DepRecord>> = vec![None; n];
    for record in graph.iter() {
        let Some(slot) = slots.get_mut((record.id as usize).wrapping_sub(1)) else {
            return Err(Error::Corrupt(format!(
                "record id {} outside 1..={n}",
                record.id
            )));
        };
        if slot.replace(record).is_some() {
            return Err(Error::Corrupt(format!("duplicate record id {}", record.id)));
        }
    }
    Ok(slots.into_iter().flatten().collect())
}

/// Checks `relation` against the policy, recording it in the header table.
fn apply_policy(
    relation: &Relation,
    policy: &RelationPolicy,
    header: &mut RelationTable,
) -> Result<Relation> {
    match policy {
        RelationPolicy::Collect => {
            header.insert(relation.name.clone(), relation.kind);
            Ok(relation.clone())
        }
        RelationPolicy::Canonical { table, strict } => {
            if relation.is_span() || table.declares(&relation.name, relation.kind) {
                return Ok(relation.clone());
            }
            if *strict {
                return Err(Error::UnknownRelation {
                    name: relation.name.clone(),
                    kind: relation.kind,
                });
            }
            tracing::warn!(
                relation = %relation.tagged(),
                "relation missing from the canonical table, substituting span"
            );
            Ok(match relation.kind {
                RelKind::Multinuc => Relation::multinuc(Relation::SPAN),
                _ => Relation::span(),
            })
        }
    }
}

/// Steps from each leaf to the graph root.
fn path_lengths(records: &[&DepRecord]) -> Result<Vec<usize>> {
    let bound = MIN_PATH_BOUND.max(records.len());
    let mut depths = Vec::with_capacity(records.len());
    for record in records {
        let mut head = record.head;
        let mut length = 0;
        while head != 0 {
            head = records[head as usize - 1].head;
            length += 1;
            if length > bound {
                return Err(Error::Cycle {
                    node: head,
                    limit: bound,
                });
            }
        }
        depths.push(length);
    }
    Ok(depths)
}

/// Sibling order by position instead of the stored `dist`: dependents
/// closest to their head first, left dependents before right ones for
/// [`DepthOrdering::Ltr`] and the reverse for [`DepthOrdering::Rtl`].
fn reordered_dists(records: &[&DepRecord], ordering: DepthOrdering) -> Vec<u32> {
    let mut left: Vec<&DepRecord> = records.iter().copied().filter(|r| r.head > r.id).collect();
    let mut right: Vec<&DepRecord> = records
        .iter()
        .copied()
        .filter(|r| r.head < r.id)
        .collect();
    left.sort_by_key(|r| r.head - r.id);
    right.sort_by_key(|r| r.id - r.head);
    let (first, second) = match ordering {
        DepthOrdering::Rtl => (right, left),
        _ => (left, right),
    };
    let mut dists: Vec<u32> = records.iter().map(|r| r.dist).collect();
    for (rank, record) in first.into_iter().chain(second).enumerate() {
        dists[record.id as usize - 1] = rank as u32;
    }
    dists
}

/// Wraps heads in spans, deepest dependents first. Returns the number of
/// spans created.
fn build_spans(tree: &mut RstTree, records: &[&DepRecord], depths: &[usize], dists: &[u32]) -> usize {
    let mut top_span: HashMap<NodeId, NodeId> = HashMap::new();
    let mut last_dist: HashMap<NodeId, u32> = HashMap::new();
    let mut attach_point: HashMap<(NodeId, u32), NodeId> = HashMap::new();
    let mut created = 0;

    let levels: BTreeSet<usize> = depths.iter().copied().collect();
    for &level in levels.iter().rev() {
        let mut batch: Vec<&DepRecord> = records
            .iter()
            .copied()
            .filter(|r| depths[r.id as usize - 1] == level && r.head != 0)
            .collect();
        batch.sort_by_key(|r| (dists[r.id as usize - 1], r.id));

        for record in batch {
            let leaf = NodeId(record.id);
            let head = NodeId(record.head);
            let dist = dists[leaf.index()];
            let child = *top_span.get(&leaf).unwrap_or(&leaf);
            let parent = *top_span.get(&head).unwrap_or(&head);

            if last_dist.get(&head) == Some(&dist) && tree[child].has_multinuc_relation() {
                if let Some(&point) = attach_point.get(&(head, dist)) {
                    tree[child].parent = Some(point);
                    continue;
                }
            }

            let span = tree.push_group(NodeKind::Span);
            created += 1;
            let relation = tree[parent].relation.replace(Relation::span());
            tree[span].relation = relation;
            tree[span].parent = None;
            tree[child].parent = Some(parent);
            tree[parent].parent = Some(span);
            last_dist.insert(head, dist);
            attach_point.insert((head, dist), parent);
            top_span.insert(head, span);
        }
    }
    created
}

/// Turns every span whose member carries a multinuc relation into a
/// multinuc group. Returns the number of promotions.
fn promote_multinucs(tree: &mut RstTree) -> Result<usize> {
    let mut done: HashSet<NodeId> = HashSet::new();
    for i in 0..tree.len() {
        let id = NodeId::from_index(i);
        if !tree[id].has_multinuc_relation() || done.contains(&id) {
            continue;
        }
        let name = tree[id]
            .relation
            .as_ref()
            .map(|r| r.name.clone())
            .unwrap_or_default();
        let Some(parent) = tree[id].parent else {
            return Err(Error::Corrupt(format!("multinuc member {id} has no parent")));
        };
        let Some(grandparent) = tree[parent].parent else {
            return Err(Error::Corrupt(format!(
                "multinuc member {id} has no enclosing span"
            )));
        };
        tree[id].parent = Some(grandparent);
        tree[grandparent].kind = NodeKind::Multinuc;
        tree[parent].relation = Some(Relation::multinuc(name));
        done.insert(parent);
    }
    Ok(done.len())
}

/// Climbs the recorded heights from each secondary edge's leaves.
fn secondary_edges(tree: &RstTree, records: &[&DepRecord]) -> Result<Vec<SecondaryEdge>> {
    let climb = |leaf: u32, height: u32| -> Result<NodeId> {
        if leaf == 0 || leaf as usize > tree.leaf_count() {
            return Err(Error::UnknownNode {
                id: leaf.to_string(),
                context: "secondary edge endpoint".to_string(),
            });
        }
        let start = NodeId(leaf);
        if height == 0 {
            return Ok(start);
        }
        tree.ancestors(start)
            .nth(height as usize - 1)
            .map(|n| n.id)
            .ok_or_else(|| {
                Error::Corrupt(format!("secondary edge climbs {height} levels above leaf {leaf}"))
            })
    };
    let mut edges = Vec::new();
    for record in records {
        for dep in &record.secedges {
            let mut edge = SecondaryEdge::new(
                climb(record.id, dep.source_height)?,
                climb(dep.target, dep.target_height)?,
                dep.relation.clone(),
            );
            edge.signals = dep.signals.clone();
            edges.push(edge);
        }
    }
    Ok(edges)
}

/// Moves signals from pass-through edges up to the edge they describe:
/// through span edges and through the edges of leftmost multinuc members.
fn percolate_signals(tree: &mut RstTree) {
    for i in 0..tree.len() {
        let mut id = NodeId::from_index(i);
        if tree[id].signals.is_empty() {
            continue;
        }
        loop {
            let node = &tree[id];
            let Some(parent) = node.parent else { break };
            let pass_through = node.has_span_relation()
                || (node.has_multinuc_relation() && node.left == tree[parent].left);
            if !pass_through {
                break;
            }
            let signals = std::mem::take(&mut tree[id].signals);
            tree[parent].signals.extend(signals);
            id = parent;
        }
    }
}
