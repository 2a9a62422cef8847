//! Post-passes that turn the `li` attachment into `chain` or `hirao`.

use super::Assignment;
use crate::model::{Node, Relation, RstTree};
use crate::{Error, Result};

fn exempt(relation: &Relation, keep_same_unit: bool) -> bool {
    keep_same_unit && relation.is_same_unit()
}

/// Re-points every multinuc member that hangs off the first member to its
/// immediate left neighbour instead.
pub fn chain(tree: &RstTree, assignments: &mut [Assignment], keep_same_unit: bool) {
    let mut rewired = 0usize;
    for multinuc in tree.groups().iter().filter(|n| n.is_multinuc()) {
        let mut members: Vec<&Node> = multinuc
            .children
            .iter()
            .map(|&c| &tree[c])
            .filter(|c| c.has_multinuc_relation())
            .collect();
        if members.len() < 2 {
            continue;
        }
        members.sort_by_key(|m| (m.left, m.id));
        let first = tree.head_leaf(members[0].id);
        for pair in members.windows(2) {
            let (prev, member) = (pair[0], pair[1]);
            if member.relation.as_ref().is_some_and(|r| exempt(r, keep_same_unit)) {
                continue;
            }
            let leaf = tree.head_leaf(member.id);
            if !tree[leaf].is_leaf() {
                continue;
            }
            let Some(slot) = assignments.get_mut(leaf.index()) else {
                continue;
            };
            let multinuc_edge = slot.relation.as_ref().is_some_and(Relation::is_multinuc);
            if slot.head == first.0 && multinuc_edge {
                slot.head = tree.head_leaf(prev.id).0;
                rewired += 1;
            }
        }
    }
    tracing::debug!(rewired, "chained multinuc members");
}

/// Every leaf attached by a multinuc relation takes over the head and
/// relation its head ends up with, so a whole multinuc hangs off one
/// attachment point.
pub fn hirao(assignments: &mut [Assignment], keep_same_unit: bool) -> Result<()> {
    let limit = assignments.len();
    let collapses = |a: &Assignment| {
        a.relation
            .as_ref()
            .is_some_and(|r| r.is_multinuc() && !exempt(r, keep_same_unit))
    };
    let before = assignments.to_vec();
    let mut collapsed = 0usize;

    for (i, slot) in assignments.iter_mut().enumerate() {
        if !collapses(&before[i]) {
            continue;
        }
        let mut head = before[i].head;
        let mut steps = 0;
        let (new_head, new_relation) = loop {
            if head == 0 {
                break (0, None);
            }
            let Some(next) = before.get(head as usize - 1) else {
                return Err(Error::UnknownNode {
                    id: head.to_string(),
                    context: format!("head of leaf {}", i + 1),
                });
            };
            if !collapses(next) {
                break (next.head, next.relation.clone());
            }
            head = next.head;
            steps += 1;
            if steps > limit {
                return Err(Error::Cycle {
                    node: i as u32 + 1,
                    limit,
                });
            }
        };
        slot.head = new_head;
        slot.relation = new_relation;
        collapsed += 1;
    }
    tracing::debug!(collapsed, "collapsed multinuc attachments");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(head: u32, relation: Option<Relation>) -> Assignment {
        Assignment {
            head,
            relation,
            signals: Vec::new(),
        }
    }

    #[test]
    fn hirao_lifts_members_to_the_multinuc_attachment() {
        // 1 -cause-> 4, 2 and 3 joint members headed by 1, 4 root.
        let mut slots = vec![
            slot(4, Some(Relation::satellite("cause"))),
            slot(1, Some(Relation::multinuc("joint"))),
            slot(1, Some(Relation::multinuc("joint"))),
            slot(0, None),
        ];
        hirao(&mut slots, false).unwrap();
        assert_eq!(slots[1].head, 4);
        assert_eq!(slots[2].relation, Some(Relation::satellite("cause")));
    }

    #[test]
    fn hirao_can_exempt_same_unit() {
        let mut slots = vec![
            slot(0, None),
            slot(1, Some(Relation::multinuc("same-unit"))),
        ];
        hirao(&mut slots, true).unwrap();
        assert_eq!(slots[1].head, 1);
        hirao(&mut slots, false).unwrap();
        assert_eq!((slots[1].head, slots[1].relation.clone()), (0, None));
    }

    #[test]
    fn hirao_reports_cycles() {
        let mut slots = vec![
            slot(2, Some(Relation::multinuc("joint"))),
            slot(1, Some(Relation::multinuc("joint"))),
        ];
        assert!(matches!(hirao(&mut slots, false), Err(Error::Cycle { .. })));
    }
}
