//! Raw document → [`RstTree`].
//!
//! Assigns dense ids (segments first, then groups, each in document order),
//! resolves every relation to a [`RelKind`], attaches signals and secondary
//! edges, and derives extents and depths.

use hashbrown::HashMap;

use super::reader::{RawDocument, RawSignal};
use crate::model::{
    NodeId, NodeKind, RelKind, Relation, RelationTable, RstTree, SecondaryEdge, Signal,
    TokenSet,
};
use crate::{Error, Result};

/// Removes the characters that separate fields in the dependency format.
pub fn sanitize_relname(name: &str) -> String {
    name.chars().filter(|c| !matches!(c, ':' | ';' | ',')).collect()
}

/// Builds a finalized tree from raw markup elements.
pub fn build(doc: RawDocument) -> Result<RstTree> {
    if doc.segments.is_empty() {
        return Err(Error::NoSegments);
    }

    let mut relations = RelationTable::new();
    let mut first_satellite = None;
    for rel in &doc.relations {
        let name = sanitize_relname(&rel.name);
        match rel.kind.as_deref() {
            Some("rst") => {
                first_satellite.get_or_insert_with(|| name.clone());
                relations.insert(name, RelKind::Satellite);
            }
            Some("multinuc") => relations.insert(name, RelKind::Multinuc),
            // Schema entries and unknown types resolve to span.
            _ => {}
        }
    }

    let mut tree = RstTree::new(relations);
    let mut ids: HashMap<String, NodeId> = HashMap::new();
    for seg in &doc.segments {
        let id = tree.push_leaf(seg.text.clone())?;
        register(&mut ids, &seg.id, id)?;
        tree[id].source_id = Some(seg.id.clone());
    }
    for group in &doc.groups {
        let kind = match group.kind.as_str() {
            "multinuc" => NodeKind::Multinuc,
            _ => NodeKind::Span,
        };
        let id = tree.push_group(kind);
        register(&mut ids, &group.id, id)?;
        tree[id].source_id = Some(group.id.clone());
    }

    // (node, parent, raw relation name) for every attached node.
    let mut edges = Vec::new();
    let raw_links = doc
        .segments
        .iter()
        .map(|s| (&s.id, &s.parent, &s.relname, true))
        .chain(doc.groups.iter().map(|g| (&g.id, &g.parent, &g.relname, false)));
    for (raw_id, parent, relname, is_segment) in raw_links {
        let Some(parent) = parent else { continue };
        let node = ids[raw_id.as_str()];
        let parent = lookup(&ids, parent, || format!("parent of node {raw_id}"))?;
        let name = match relname {
            Some(name) => sanitize_relname(name),
            None if is_segment => first_satellite
                .clone()
                .unwrap_or_else(|| Relation::SPAN.to_string()),
            None => Relation::SPAN.to_string(),
        };
        edges.push((node, parent, name));
    }

    let mut siblings: HashMap<(NodeId, &str), usize> = HashMap::new();
    for (_, parent, name) in &edges {
        *siblings.entry((*parent, name.as_str())).or_default() += 1;
    }
    let mut resolved = Vec::with_capacity(edges.len());
    for (node, parent, name) in &edges {
        let shared = siblings[&(*parent, name.as_str())];
        let relation = resolve(&tree, *node, *parent, name, shared);
        resolved.push((*node, *parent, relation));
    }
    for (node, parent, relation) in resolved {
        tree[node].parent = Some(parent);
        tree[node].relation = Some(relation);
    }

    let mut edge_ids: HashMap<String, usize> = HashMap::new();
    for raw in &doc.secedges {
        let source = lookup(&ids, &raw.source, || format!("source of secedge {}", raw.id))?;
        let target = lookup(&ids, &raw.target, || format!("target of secedge {}", raw.id))?;
        edge_ids.insert(raw.id.clone(), tree.secedges.len());
        tree.secedges.push(SecondaryEdge::new(
            source,
            target,
            sanitize_relname(&raw.relname),
        ));
    }

    for raw in &doc.signals {
        let signal = signal(raw)?;
        if let Some(&node) = ids.get(raw.source.as_str()) {
            tree[node].signals.push(signal);
        } else if let Some(&edge) = edge_ids.get(raw.source.as_str()) {
            tree.secedges[edge].signals.push(signal);
        } else {
            return Err(Error::UnknownNode {
                id: raw.source.clone(),
                context: "signal source".to_string(),
            });
        }
    }

    tree.finalize()?;

    let roots = tree.roots().count();
    if roots > 1 {
        tracing::warn!(roots, "constituent tree has more than one root");
    }
    tracing::debug!(
        leaves = tree.leaf_count(),
        groups = tree.groups().len(),
        secedges = tree.secedges.len(),
        "built constituent tree"
    );
    Ok(tree)
}

fn register(ids: &mut HashMap<String, NodeId>, raw: &str, id: NodeId) -> Result<()> {
    if ids.insert(raw.to_string(), id).is_some() {
        return Err(Error::Malformed(format!("duplicate node id {raw:?}")));
    }
    Ok(())
}

fn lookup(
    ids: &HashMap<String, NodeId>,
    raw: &str,
    context: impl FnOnce() -> String,
) -> Result<NodeId> {
    ids.get(raw).copied().ok_or_else(|| Error::UnknownNode {
        id: raw.to_string(),
        context: context(),
    })
}

/// A multinuc reading requires a multinuc parent and at least two
/// children of that parent sharing the name; everything else declared is a
/// satellite relation and anything undeclared is span.
fn resolve(tree: &RstTree, node: NodeId, parent: NodeId, name: &str, shared: usize) -> Relation {
    if name == Relation::SPAN {
        return Relation::span();
    }
    let table = &tree.relations;
    let multinuc_ok = tree[parent].is_multinuc() && shared >= 2;
    if table.declares(name, RelKind::Multinuc) && multinuc_ok {
        return Relation::multinuc(name);
    }
    if table.declares(name, RelKind::Satellite) {
        return Relation::satellite(name);
    }
    if table.declares(name, RelKind::Multinuc) {
        tracing::warn!(
            node = %node,
            relation = name,
            "multinuc relation without a multinuc sibling, read as satellite"
        );
        return Relation::satellite(name);
    }
    Relation::span()
}

fn signal(raw: &RawSignal) -> Result<Signal> {
    let tokens = raw
        .tokens
        .parse::<TokenSet>()
        .map_err(|e| Error::Malformed(format!("signal on {}: {e}", raw.source)))?;
    let mut signal = Signal::new(raw.kind.clone(), raw.subtype.clone(), tokens);
    signal.status = raw.status.clone();
    Ok(signal)
}
