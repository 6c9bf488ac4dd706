//! Property tests pitting the galloping cursor and the merge-join
//! against oblivious reference implementations, and checking that
//! staged (semi-naive) evaluation agrees with one-shot evaluation.
use proptest::prelude::*;
use seminaive_fixpoint::gallop::gallop;
use seminaive_fixpoint::join::{join_into, merge_join};
use seminaive_fixpoint::{Relation, Variable};

proptest! {
    #[test]
    fn gallop_agrees_with_linear_scan(
        mut sorted in prop::collection::vec(any::<u16>(), 0..200),
        threshold in any::<u16>(),
    ) {
        sorted.sort_unstable();

        let suffix = gallop(&sorted, |x| *x < threshold);
        let skipped = sorted.iter().take_while(|x| **x < threshold).count();

        prop_assert_eq!(suffix, &sorted[skipped..]);
    }

    #[test]
    fn merge_join_agrees_with_cross_product(
        lhs in prop::collection::vec((0u8..16, any::<u8>()), 0..48),
        rhs in prop::collection::vec((0u8..16, any::<u8>()), 0..48),
    ) {
        // Keys are drawn from a small range on purpose: duplicate-key
        // runs on both sides are the interesting case.
        let lhs: Relation<(u8, u8)> = lhs.into();
        let rhs: Relation<(u8, u8)> = rhs.into();

        let mut pairs = Vec::new();
        merge_join(&lhs, &rhs, |key, left, right| pairs.push((*key, *left, *right)));
        pairs.sort_unstable();

        let mut expected = Vec::new();
        for (left_key, left_val) in lhs.iter() {
            for (right_key, right_val) in rhs.iter() {
                if left_key == right_key {
                    expected.push((*left_key, *left_val, *right_val));
                }
            }
        }
        expected.sort_unstable();

        prop_assert_eq!(pairs, expected);
    }

    #[test]
    fn staged_joins_match_one_shot(
        stages in prop::collection::vec(
            (
                prop::collection::vec((0u8..8, 0u8..8), 0..12),
                prop::collection::vec((0u8..8, 0u8..8), 0..12),
            ),
            1..5,
        ),
    ) {
        let mut left: Variable<(u8, u8)> = Variable::new("left");
        let mut right: Variable<(u8, u8)> = Variable::new("right");
        let mut matches: Variable<(u8, u8, u8)> = Variable::new("matches");

        // Incremental: insert stage by stage, converging in between.
        for (left_batch, right_batch) in &stages {
            left.insert(left_batch.clone());
            right.insert(right_batch.clone());

            loop {
                join_into(&left, &right, &mut matches, |key, lhs, rhs| (*key, *lhs, *rhs));

                let mut active = false;
                active |= left.advance();
                active |= right.advance();
                active |= matches.advance();
                if !active {
                    break;
                }
            }
        }

        // One shot: the cross product of the unions of all stages.
        let mut expected = Vec::new();
        let all_left: Relation<(u8, u8)> =
            stages.iter().flat_map(|(l, _)| l.iter().copied()).collect();
        let all_right: Relation<(u8, u8)> =
            stages.iter().flat_map(|(_, r)| r.iter().copied()).collect();
        for (left_key, left_val) in all_left.iter() {
            for (right_key, right_val) in all_right.iter() {
                if left_key == right_key {
                    expected.push((*left_key, *left_val, *right_val));
                }
            }
        }
        expected.sort_unstable();
        expected.dedup();

        prop_assert_eq!(matches.complete().into_vec(), expected);
    }
}
