//! Rules are pairwise equi-joins: given two inputs of `(Key, Value)`
//! tuples sorted by key, every pair of tuples agreeing on the key
//! produces one derived tuple.  Because both inputs are sorted, the
//! join is a two-cursor merge; runs of equal keys are
//! cross-multiplied, and mismatched runs are skipped with a galloping
//! cursor rather than element by element.
//!
//! The interesting part is not joining two relations, it is *not*
//! re-joining them.  A variable's tuples are split into `settled` and
//! `fresh` tiers, and one application of a rule only visits the three
//! tier combinations that can contain a pair nobody has seen:
//! fresh × settled, settled × fresh, and fresh × fresh.  A pair with
//! both sides settled was already emitted in the round where the
//! later-settled side was still fresh: tuples only move from pending
//! to fresh to settled, rules run every round before any variable
//! advances, and fresh stays disjoint from settled.  Each matching
//! pair is therefore discovered exactly once over the whole
//! computation.
//!
//! Derived tuples are pushed through a caller-supplied combining
//! function and land in the output variable's pending tier; the join
//! itself allocates nothing beyond the output batch.  The combining
//! function is a generic parameter rather than a boxed closure, so
//! per-pair dispatch is static.
use crate::gallop::gallop;
use crate::relation::Relation;
use crate::variable::Variable;
use std::cmp::Ordering;

/// Calls `matched` once for every pair of tuples, one from each
/// input, whose keys are equal.  Runs of duplicate keys are
/// cross-multiplied: a key appearing n times on the left and m times
/// on the right fires the callback n × m times.
///
/// Both inputs must be sorted by key (relations are); no pair
/// ordering is guaranteed within a key group.
pub fn merge_join<Key, Val1, Val2>(
    mut left: &[(Key, Val1)],
    mut right: &[(Key, Val2)],
    mut matched: impl FnMut(&Key, &Val1, &Val2),
) where
    Key: Ord,
{
    while !left.is_empty() && !right.is_empty() {
        match left[0].0.cmp(&right[0].0) {
            Ordering::Less => {
                let frontier = &right[0].0;
                left = gallop(left, |(key, _)| key < frontier);
            }
            Ordering::Greater => {
                let frontier = &left[0].0;
                right = gallop(right, |(key, _)| key < frontier);
            }
            Ordering::Equal => {
                let key = &left[0].0;
                let left_run = run_length(left, key);
                let right_run = run_length(right, key);

                for (_, left_val) in &left[..left_run] {
                    for (_, right_val) in &right[..right_run] {
                        matched(key, left_val, right_val);
                    }
                }

                left = &left[left_run..];
                right = &right[right_run..];
            }
        }
    }
}

/// Counts the leading tuples of `slice` whose key equals `key`.
///
/// Runs are usually short, so a unit-step scan beats setting up a
/// gallop here.
fn run_length<Key: Ord, Val>(slice: &[(Key, Val)], key: &Key) -> usize {
    slice
        .iter()
        .take_while(|(candidate, _)| candidate == key)
        .count()
}

/// One semi-naive application of a join rule: every key-matching pair
/// drawn from `left.fresh × right.settled`, `left.settled ×
/// right.fresh` and `left.fresh × right.fresh` is passed through
/// `logic`, and the derived tuples are returned as a relation.
///
/// Use this form when the rule's output variable is also one of its
/// inputs (the usual recursive rule): derive the batch while the
/// inputs are only borrowed, then `insert` it.  `join_into` wraps the
/// common non-recursive case.
#[must_use]
pub fn join<Key, Val1, Val2, Tuple>(
    left: &Variable<(Key, Val1)>,
    right: &Variable<(Key, Val2)>,
    mut logic: impl FnMut(&Key, &Val1, &Val2) -> Tuple,
) -> Relation<Tuple>
where
    Key: Ord,
    Val1: Ord,
    Val2: Ord,
    Tuple: Ord,
{
    let mut derived = Vec::new();

    {
        let mut emit =
            |key: &Key, left_val: &Val1, right_val: &Val2| derived.push(logic(key, left_val, right_val));

        for settled in left.settled() {
            merge_join(settled, right.fresh(), &mut emit);
        }

        for settled in right.settled() {
            merge_join(left.fresh(), settled, &mut emit);
        }

        merge_join(left.fresh(), right.fresh(), &mut emit);
    }

    derived.into()
}

/// Applies a join rule and inserts the derived batch into `output`'s
/// pending tier.  Call once per rule per round, before any variable
/// advances.
pub fn join_into<Key, Val1, Val2, Tuple>(
    left: &Variable<(Key, Val1)>,
    right: &Variable<(Key, Val2)>,
    output: &mut Variable<Tuple>,
    logic: impl FnMut(&Key, &Val1, &Val2) -> Tuple,
) where
    Key: Ord,
    Val1: Ord,
    Val2: Ord,
    Tuple: Ord,
{
    let derived = join(left, right, logic);
    output.insert(derived);
}

/// Joins a variable against a static relation and returns the
/// derived batch.  The static side never changes, so the only pairs
/// nobody has seen are `left.fresh × right`.
///
/// As with `join`, this form exists for rules that feed their own
/// input variable; `join_relation_into` wraps the rest.
#[must_use]
pub fn join_relation<Key, Val1, Val2, Tuple>(
    left: &Variable<(Key, Val1)>,
    right: &Relation<(Key, Val2)>,
    mut logic: impl FnMut(&Key, &Val1, &Val2) -> Tuple,
) -> Relation<Tuple>
where
    Key: Ord,
    Val1: Ord,
    Val2: Ord,
    Tuple: Ord,
{
    let mut derived = Vec::new();
    merge_join(left.fresh(), right, |key, left_val, right_val| {
        derived.push(logic(key, left_val, right_val))
    });

    derived.into()
}

/// Joins a variable against a static relation, inserting the derived
/// batch into `output`'s pending tier.
pub fn join_relation_into<Key, Val1, Val2, Tuple>(
    left: &Variable<(Key, Val1)>,
    right: &Relation<(Key, Val2)>,
    output: &mut Variable<Tuple>,
    logic: impl FnMut(&Key, &Val1, &Val2) -> Tuple,
) where
    Key: Ord,
    Val1: Ord,
    Val2: Ord,
    Tuple: Ord,
{
    let derived = join_relation(left, right, logic);
    output.insert(derived);
}

/// The unary analogue of `join_into`: transforms every tuple in
/// `input`'s fresh tier and proposes the results to `output`.  This
/// is how tuples get re-keyed between joins, e.g. to chain a
/// three-way join through an intermediate variable.
pub fn map_into<Input, Output>(
    input: &Variable<Input>,
    output: &mut Variable<Output>,
    logic: impl FnMut(&Input) -> Output,
) where
    Input: Ord,
    Output: Ord,
{
    let derived: Vec<Output> = input.fresh().iter().map(logic).collect();
    output.insert(derived);
}

#[cfg(test)]
fn brute_force_join<Key, Val1, Val2>(
    left: &[(Key, Val1)],
    right: &[(Key, Val2)],
) -> Vec<(Key, Val1, Val2)>
where
    Key: Clone + Ord,
    Val1: Clone + Ord,
    Val2: Clone + Ord,
{
    let mut pairs = Vec::new();
    for (lk, lv) in left {
        for (rk, rv) in right {
            if lk == rk {
                pairs.push((lk.clone(), lv.clone(), rv.clone()));
            }
        }
    }

    pairs.sort();
    pairs
}

#[test]
fn test_merge_join_matches_brute_force() {
    let left: Relation<(u32, char)> =
        vec![(1, 'a'), (1, 'b'), (3, 'c'), (4, 'd'), (7, 'e')].into();
    let right: Relation<(u32, u32)> = vec![(0, 10), (1, 11), (3, 12), (3, 13), (6, 14)].into();

    let mut pairs = Vec::new();
    merge_join(&left, &right, |key, lhs, rhs| {
        pairs.push((*key, *lhs, *rhs))
    });
    pairs.sort();

    assert_eq!(pairs, brute_force_join(&left, &right));
}

#[test]
fn test_merge_join_cross_multiplies_runs() {
    // Two values under key 1 on each side: four pairs, not two.
    let left: Relation<(u32, char)> = vec![(1, 'a'), (1, 'b')].into();
    let right: Relation<(u32, u32)> = vec![(1, 10), (1, 20)].into();

    let mut pairs = Vec::new();
    merge_join(&left, &right, |key, lhs, rhs| {
        pairs.push((*key, *lhs, *rhs))
    });
    pairs.sort();

    assert_eq!(
        pairs,
        vec![(1, 'a', 10), (1, 'a', 20), (1, 'b', 10), (1, 'b', 20)]
    );
}

#[test]
fn test_merge_join_empty_sides() {
    let relation: Relation<(u32, u32)> = vec![(1, 2), (3, 4)].into();
    let empty: Relation<(u32, u32)> = Relation::empty();

    let mut count = 0;
    merge_join(&relation, &empty, |_, _, _| count += 1);
    merge_join(&empty, &relation, |_, _, _| count += 1);
    merge_join(&empty, &empty, |_, _, _| count += 1);
    assert_eq!(count, 0);
}

#[test]
fn test_merge_join_disjoint_keys() {
    // Long mismatched runs exercise the galloping skip.
    let left: Relation<(u32, u32)> = (0..100).map(|i| (2 * i, i)).collect();
    let right: Relation<(u32, u32)> = (0..100).map(|i| (2 * i + 1, i)).collect();

    let mut count = 0;
    merge_join(&left, &right, |_, _, _| count += 1);
    assert_eq!(count, 0);
}

#[test]
fn test_join_visits_each_pair_once() {
    // Stage tuples over several rounds and count every emitted pair;
    // no (left, right) pair may be derived twice.
    let mut left: Variable<(u32, u32)> = Variable::new("left");
    let mut right: Variable<(u32, u32)> = Variable::new("right");

    let mut emitted = Vec::new();
    let stages: [(&[(u32, u32)], &[(u32, u32)]); 3] = [
        (&[(1, 10), (2, 20)], &[(1, 100)]),
        (&[(1, 11)], &[(2, 200), (3, 300)]),
        (&[(3, 30)], &[(1, 101)]),
    ];

    for (left_batch, right_batch) in stages.iter() {
        left.insert(left_batch.to_vec());
        right.insert(right_batch.to_vec());

        loop {
            let batch = join(&left, &right, |key, lhs, rhs| (*key, *lhs, *rhs));
            emitted.extend(batch.into_vec());

            let left_active = left.advance();
            let right_active = right.advance();
            if !left_active && !right_active {
                break;
            }
        }
    }

    let mut deduplicated = emitted.clone();
    deduplicated.sort();
    deduplicated.dedup();
    assert_eq!(emitted.len(), deduplicated.len(), "a pair was emitted twice");

    // And the union of every emission matches the one-shot join.
    emitted.sort();
    let all_left: Vec<(u32, u32)> = stages.iter().flat_map(|(l, _)| l.iter().copied()).collect();
    let all_right: Vec<(u32, u32)> = stages.iter().flat_map(|(_, r)| r.iter().copied()).collect();
    let left_relation: Relation<(u32, u32)> = all_left.into();
    let right_relation: Relation<(u32, u32)> = all_right.into();
    let expected = brute_force_join(&left_relation, &right_relation);
    assert_eq!(emitted, expected);
}

#[test]
fn test_join_into_writes_to_output() {
    let mut parents: Variable<(u32, u32)> = Variable::new("parents");
    let mut grandparents: Variable<(u32, u32)> = Variable::new("grandparents");

    // grandparent(g, c) <- parent(g, p), parent(p, c), with both
    // sides keyed by the middle person p.
    let mut by_child: Variable<(u32, u32)> = Variable::new("by_child");
    parents.insert(vec![(2u32, 1u32), (3, 2), (4, 2)]);

    loop {
        map_into(&parents, &mut by_child, |&(parent, child)| (child, parent));
        join_into(
            &by_child,
            &parents,
            &mut grandparents,
            |_middle, &grandparent, &child| (grandparent, child),
        );

        let mut active = false;
        active |= parents.advance();
        active |= by_child.advance();
        active |= grandparents.advance();
        if !active {
            break;
        }
    }

    // parent(2, 1), parent(3, 2), parent(4, 2): 1's grandparents are
    // 3 and 4.
    assert_eq!(&grandparents.complete()[..], &[(3, 1), (4, 1)]);
}

#[test]
fn test_join_relation_into_only_needs_fresh() {
    let labels: Relation<(u32, char)> = vec![(1, 'a'), (2, 'b'), (3, 'c'), (4, 'd')].into();
    let mut seen: Variable<(u32, u32)> = Variable::new("seen");
    let mut labelled: Variable<(u32, char)> = Variable::new("labelled");

    // Stage the dynamic side over several rounds; (2, 1) re-derives
    // (2, 'b') in a later round, which promotion must drop.
    let stages: [&[(u32, u32)]; 3] = [&[(1, 0)], &[(2, 0), (3, 0)], &[(2, 1)]];
    let mut stages = stages.iter();

    loop {
        if let Some(batch) = stages.next() {
            seen.insert(batch.to_vec());
        }

        join_relation_into(&seen, &labels, &mut labelled, |&key, _, &label| {
            (key, label)
        });

        let mut active = false;
        active |= seen.advance();
        active |= labelled.advance();
        if !active {
            break;
        }
    }

    // Tuples proposed in later rounds still meet the static side.
    assert_eq!(&labelled.complete()[..], &[(1, 'a'), (2, 'b'), (3, 'c')]);
}

#[test]
fn test_map_into_transforms_fresh_only() {
    let mut source: Variable<u32> = Variable::new("source");
    let mut doubled: Variable<u32> = Variable::new("doubled");

    source.insert(vec![1u32, 2]);
    source.advance();

    map_into(&source, &mut doubled, |x| 2 * x);
    doubled.advance();
    assert_eq!(&doubled.fresh()[..], &[2, 4]);

    // Nothing fresh on the source: mapping proposes nothing.
    source.advance();
    map_into(&source, &mut doubled, |x| 2 * x);
    assert!(!doubled.advance());
}
