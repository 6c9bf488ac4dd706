//! End-to-end closure computation on a denser graph, checked against
//! a plain breadth-first reference.
use seminaive_fixpoint::{fixpoint, join, Relation, Variable};
use std::collections::{BTreeSet, VecDeque};

/// A deterministic, mildly tangled edge sample over 12 nodes.
fn sample_edges() -> Vec<(u32, u32)> {
    let mut edges = Vec::new();
    let mut state = 1u32;
    for _ in 0..64 {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        edges.push(((state >> 16) % 12, (state >> 8) % 12));
    }

    edges
}

/// All (from, to) pairs joined by a path of length >= 1, by
/// breadth-first search from every node.
fn reference_closure(edges: &[(u32, u32)]) -> BTreeSet<(u32, u32)> {
    let nodes: BTreeSet<u32> = edges.iter().flat_map(|&(a, b)| vec![a, b]).collect();

    let mut closure = BTreeSet::new();
    for &start in &nodes {
        let mut queue: VecDeque<u32> = edges
            .iter()
            .filter(|&&(from, _)| from == start)
            .map(|&(_, to)| to)
            .collect();

        while let Some(node) = queue.pop_front() {
            if closure.insert((start, node)) {
                queue.extend(
                    edges
                        .iter()
                        .filter(|&&(from, _)| from == node)
                        .map(|&(_, to)| to),
                );
            }
        }
    }

    closure
}

#[test]
fn closure_matches_breadth_first_reference() {
    let _ = env_logger::builder().is_test(true).try_init();

    let edges: Relation<(u32, u32)> = sample_edges().into();
    let mut reach: Variable<(u32, u32)> = Variable::new("reach");
    let mut by_dst: Variable<(u32, u32)> = Variable::new("reach_by_dst");

    reach.insert(sample_edges());
    loop {
        join::map_into(&reach, &mut by_dst, |&(src, dst)| (dst, src));
        let extended = join::join_relation(&by_dst, &edges, |_mid, &src, &dst| (src, dst));
        reach.insert(extended);

        if !fixpoint::advance_round(&mut [&mut reach, &mut by_dst]) {
            break;
        }
    }

    let closure = reach.complete();
    let expected = reference_closure(&sample_edges());
    assert_eq!(closure.len(), expected.len());
    assert!(closure.iter().copied().eq(expected.iter().copied()));
}
