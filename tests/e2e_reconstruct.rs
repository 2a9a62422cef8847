//! End-to-end tests for rsd → markup reconstruction.

use rstdep::{
    ConvertConfig, Converter, DepthOrdering, Error, NodeId, RelKind, RelationPolicy,
    RelationTable,
};

fn rsd(lines: &[&str]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// ============================================================================
// 1. Relation header policies
// ============================================================================

#[test]
fn test_collect_declares_used_relations_only() {
    let input = rsd(&[
        "# newdoc id = sample",
        "1\tWhen it rains,\t0\t_\t_\t_\t2\tcircumstance_r\t_\t_",
        "2\twe read\t0\t_\t_\t_\t0\tROOT\t_\t_",
        "3\tand write.\t0\t_\t_\t_\t2\tjoint_m\t_\t_",
    ]);
    let out = Converter::default().rsd_to_rs3(&input).unwrap();
    assert!(out.contains("<rel name=\"circumstance\" type=\"rst\"/>"));
    assert!(out.contains("<rel name=\"joint\" type=\"multinuc\"/>"));
    assert_eq!(out.matches("<rel ").count(), 2);
}

#[test]
fn test_canonical_table_lists_every_relation() {
    let input = rsd(&[
        "1\ta\t0\t_\t_\t_\t2\tcausal-cause_r\t_\t_",
        "2\tb\t0\t_\t_\t_\t0\tROOT\t_\t_",
    ]);
    let converter = Converter::new(ConvertConfig::default().with_relations(RelationPolicy::erst(true)));
    let out = converter.rsd_to_rs3(&input).unwrap();
    assert_eq!(out.matches("<rel ").count(), RelationTable::erst_default().len());
    assert!(out.contains("<segment id=\"1\" parent=\"2\" relname=\"causal-cause\">a</segment>"));
}

#[test]
fn test_strict_policy_halts_on_unknown_relation() {
    let input = rsd(&[
        "1\ta\t0\t_\t_\t_\t2\tbecause_r\t_\t_",
        "2\tb\t0\t_\t_\t_\t0\tROOT\t_\t_",
    ]);
    let strict = Converter::new(ConvertConfig::default().with_relations(RelationPolicy::erst(true)));
    let err = strict.rsd_to_rs3(&input).unwrap_err();
    assert!(err.halts_run());
    assert!(matches!(
        err,
        Error::UnknownRelation { ref name, kind: RelKind::Satellite } if name == "because"
    ));

    let lenient = Converter::new(ConvertConfig::default().with_relations(RelationPolicy::erst(false)));
    let out = lenient.rsd_to_rs3(&input).unwrap();
    assert!(out.contains("<segment id=\"1\" parent=\"2\" relname=\"span\">a</segment>"));
}

// ============================================================================
// 2. Sibling ordering
// ============================================================================

#[test]
fn test_dist_orders_satellite_layers() {
    // Both satellites of 2; the higher dist wraps the lower.
    let input = rsd(&[
        "1\ta\t1\t_\t_\t_\t2\tcause_r\t_\t_",
        "2\tb\t0\t_\t_\t_\t0\tROOT\t_\t_",
        "3\tc\t0\t_\t_\t_\t2\tresult_r\t_\t_",
    ]);
    let converter = Converter::default();
    let tree = converter
        .reconstruct(&rstdep::DepGraph::parse(&input).unwrap())
        .unwrap();
    assert_eq!(tree[NodeId(3)].parent, Some(NodeId(2)));
    let inner = tree[NodeId(2)].parent.unwrap();
    assert_eq!(tree[NodeId(1)].parent, Some(inner));
    assert_eq!(tree.len(), 5);

    let ltr = Converter::new(ConvertConfig::default().with_ordering(DepthOrdering::Ltr));
    let tree = ltr
        .reconstruct(&rstdep::DepGraph::parse(&input).unwrap())
        .unwrap();
    assert_eq!(tree[NodeId(1)].parent, Some(NodeId(2)));
}

// ============================================================================
// 3. Invalid graphs
// ============================================================================

#[test]
fn test_dangling_head_names_the_missing_leaf() {
    let input = rsd(&["1\ta\t0\t_\t_\t_\t3\tcause_r\t_\t_", "2\tb\t0\t_\t_\t_\t0\tROOT\t_\t_"]);
    let err = Converter::default().rsd_to_rs3(&input).unwrap_err();
    assert_eq!(err.to_string(), "Unknown node 3 (head of leaf 1)");
}

#[test]
fn test_cyclic_heads_are_rejected() {
    let input = rsd(&[
        "1\ta\t0\t_\t_\t_\t3\tcause_r\t_\t_",
        "2\tb\t0\t_\t_\t_\t1\tcause_r\t_\t_",
        "3\tc\t0\t_\t_\t_\t2\tcause_r\t_\t_",
    ]);
    let err = Converter::default().rsd_to_rs3(&input).unwrap_err();
    assert!(matches!(err, Error::Cycle { .. }));
}

#[test]
fn test_short_rows_are_syntax_errors() {
    let input = rsd(&["1\ta\t0\t_\t_\t_\t0\tROOT\t_\t_", "2\tb\t0"]);
    let err = Converter::default().rsd_to_rs3(&input).unwrap_err();
    assert!(matches!(err, Error::Syntax { line: 2, .. }));
}

#[test]
fn test_empty_graph_has_no_segments() {
    let err = Converter::default().rsd_to_rs3("# nothing here\n").unwrap_err();
    assert!(matches!(err, Error::NoSegments));
}

#[test]
fn test_config_from_json_drives_conversion() {
    let config = ConvertConfig::from_json(r#"{"ordering": "rtl"}"#).unwrap();
    assert_eq!(config.ordering, DepthOrdering::Rtl);
    let err = "sideways".parse::<DepthOrdering>().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
