//! [`RstTree`] → canonical rs3 markup.
//!
//! Output is fully determined by the tree: header entries are sorted,
//! segments and groups appear in id order, secondary edges by
//! `(source, target)` and signals by anchor and first token. Two equal
//! canonicalized trees therefore serialize to identical text.

use quick_xml::escape::{escape, partial_escape};

use crate::model::{Node, RstTree, Signal, SignalInventory};

/// Writer switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Write the default eRST signal inventory into `<sigtypes>` instead of
    /// the types observed in the document.
    pub default_signals: bool,
}

/// Serializes `tree`. Ids are written as they are, so callers that need
/// canonical output canonicalize first.
pub fn write(tree: &RstTree, options: WriteOptions) -> String {
    let mut observed = SignalInventory::new();
    let signals = signal_lines(tree, &mut observed);
    let inventory = if options.default_signals {
        SignalInventory::erst_default()
    } else {
        observed
    };

    let mut out = header(tree, &inventory);
    let segments: Vec<String> = tree.leaves().iter().map(segment_line).collect();
    let groups: Vec<String> = tree.groups().iter().map(group_line).collect();
    out.push_str(&segments.join("\n"));
    out.push('\n');
    out.push_str(&groups.join("\n"));

    let secedges = secedge_lines(tree);
    if !secedges.is_empty() {
        out.push_str("\n\t\t<secedges>\n");
        out.push_str(&secedges.join("\n"));
        out.push_str("\n\t\t</secedges>");
    }
    if !signals.is_empty() {
        out.push_str("\n\t\t<signals>\n");
        out.push_str(&signals.join("\n"));
        out.push_str("\n\t\t</signals>");
    }
    out.push_str("\n\t</body>\n</rst>\n");
    out
}

fn header(tree: &RstTree, inventory: &SignalInventory) -> String {
    let mut rels: Vec<String> = tree
        .relations
        .iter()
        .map(|(name, kind)| {
            format!(
                "\t\t\t<rel name=\"{}\" type=\"{}\"/>",
                escape(name),
                kind.markup_name()
            )
        })
        .collect();
    rels.sort();

    let mut out = String::from("<rst>\n\t<header>\n\t\t<relations>\n");
    out.push_str(&rels.join("\n"));
    out.push_str("\n\t\t</relations>");
    if !inventory.is_empty() {
        out.push_str("\n\t\t<sigtypes>\n");
        for (kind, subtypes) in inventory.iter() {
            let subtypes: Vec<&str> = subtypes.iter().map(String::as_str).collect();
            out.push_str(&format!(
                "\t\t\t<sig type=\"{}\" subtypes=\"{}\"/>\n",
                escape(kind),
                escape(&subtypes.join(";"))
            ));
        }
        out.push_str("\t\t</sigtypes>");
    }
    out.push_str("\n\t</header>\n\t<body>\n");
    out
}

/// ` parent="P" relname="r"`, or nothing for a root.
fn attachment(node: &Node) -> String {
    match (node.parent, &node.relation) {
        (Some(parent), Some(rel)) => {
            format!(" parent=\"{parent}\" relname=\"{}\"", escape(&rel.name))
        }
        (Some(parent), None) => format!(" parent=\"{parent}\" relname=\"span\""),
        _ => String::new(),
    }
}

fn segment_line(node: &Node) -> String {
    format!(
        "\t\t<segment id=\"{}\"{}>{}</segment>",
        node.id,
        attachment(node),
        partial_escape(node.text())
    )
}

fn group_line(node: &Node) -> String {
    format!(
        "\t\t<group id=\"{}\" type=\"{}\"{}/>",
        node.id,
        node.kind.group_type().unwrap_or("span"),
        attachment(node)
    )
}

fn secedge_lines(tree: &RstTree) -> Vec<String> {
    let mut edges: Vec<_> = tree.secedges.iter().collect();
    edges.sort_by_key(|e| (e.source, e.target));
    edges
        .into_iter()
        .map(|e| {
            format!(
                "\t\t\t<secedge id=\"{}\" source=\"{}\" target=\"{}\" relname=\"{}\"/>",
                e.key(),
                e.source,
                e.target,
                escape(&e.relation)
            )
        })
        .collect()
}

/// Signal lines sorted by anchor, then by first token. Records every
/// `(type, subtype)` written into `observed`.
fn signal_lines(tree: &RstTree, observed: &mut SignalInventory) -> Vec<String> {
    let mut keyed: Vec<((u32, u32), String)> = Vec::new();
    for node in tree.nodes() {
        for sig in &node.signals {
            keyed.push((
                (node.id.0, sig.tokens.first().unwrap_or(0)),
                signal_line(&node.id.to_string(), sig, observed),
            ));
        }
    }
    let mut edges: Vec<_> = tree.secedges.iter().collect();
    edges.sort_by_key(|e| (e.source, e.target));
    for edge in edges {
        for sig in &edge.signals {
            keyed.push((
                (edge.source.0, sig.tokens.first().unwrap_or(0)),
                signal_line(&edge.key(), sig, observed),
            ));
        }
    }
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, line)| line).collect()
}

fn signal_line(source: &str, sig: &Signal, observed: &mut SignalInventory) -> String {
    // Discourse markers and orphans carry their type as subtype.
    let subtype = match sig.kind.as_str() {
        "dm" | "orphan" => sig.kind.as_str(),
        _ => sig.subtype.as_str(),
    };
    observed.record(&sig.kind, subtype);
    let status = sig
        .status
        .as_ref()
        .map(|s| format!(" status=\"{}\"", escape(s)))
        .unwrap_or_default();
    format!(
        "\t\t\t<signal source=\"{source}\" type=\"{}\" subtype=\"{}\" tokens=\"{}\"{status}/>",
        escape(&sig.kind),
        escape(subtype),
        sig.tokens.expanded()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, NodeKind, Relation, RelationTable, RelKind, SecondaryEdge, TokenSet};
    use pretty_assertions::assert_eq;

    fn two_leaf_tree() -> RstTree {
        let mut rels = RelationTable::new();
        rels.insert("circumstance", RelKind::Satellite);
        let mut tree = RstTree::new(rels);
        let a = tree.push_leaf("When it rains,").unwrap();
        let b = tree.push_leaf("we <stay> in & read.").unwrap();
        let span = tree.push_group(NodeKind::Span);
        tree[a].parent = Some(b);
        tree[a].relation = Some(Relation::satellite("circumstance"));
        tree[b].parent = Some(span);
        tree[b].relation = Some(Relation::span());
        tree[a]
            .signals
            .push(Signal::new("dm", "when", TokenSet::new(vec![1])).with_status("gold"));
        tree.secedges.push(SecondaryEdge::new(b, a, "circumstance"));
        tree.finalize().unwrap();
        tree
    }

    #[test]
    fn writes_canonical_markup() {
        let out = write(&two_leaf_tree(), WriteOptions::default());
        let expected = "<rst>\n\t<header>\n\t\t<relations>\n\
\t\t\t<rel name=\"circumstance\" type=\"rst\"/>\n\t\t</relations>\n\
\t\t<sigtypes>\n\t\t\t<sig type=\"dm\" subtypes=\"dm\"/>\n\t\t</sigtypes>\n\
\t</header>\n\t<body>\n\
\t\t<segment id=\"1\" parent=\"2\" relname=\"circumstance\">When it rains,</segment>\n\
\t\t<segment id=\"2\" parent=\"3\" relname=\"span\">we &lt;stay&gt; in &amp; read.</segment>\n\
\t\t<group id=\"3\" type=\"span\"/>\n\
\t\t<secedges>\n\t\t\t<secedge id=\"2-1\" source=\"2\" target=\"1\" relname=\"circumstance\"/>\n\t\t</secedges>\n\
\t\t<signals>\n\t\t\t<signal source=\"1\" type=\"dm\" subtype=\"dm\" tokens=\"1\" status=\"gold\"/>\n\t\t</signals>\n\
\t</body>\n</rst>\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn default_signal_inventory_replaces_observed_types() {
        let out = write(&two_leaf_tree(), WriteOptions { default_signals: true });
        assert!(out.contains("<sig type=\"syntactic\""));
        assert!(out.contains("<sig type=\"dm\" subtypes=\"dm\"/>"));
    }

    #[test]
    fn root_segment_keeps_its_text() {
        let mut tree = RstTree::new(RelationTable::new());
        tree.push_leaf("alone").unwrap();
        tree.finalize().unwrap();
        let out = write(&tree, WriteOptions::default());
        assert!(out.contains("\t\t<segment id=\"1\">alone</segment>\n\n\t</body>"));
        assert_eq!(tree[NodeId(1)].depth, 0);
    }
}
