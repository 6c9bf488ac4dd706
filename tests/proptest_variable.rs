//! Property tests for the tiered accumulator: the settled list keeps
//! its geometric shape under arbitrary insert/advance interleavings,
//! tiers stay disjoint, and flattening loses nothing.
use proptest::prelude::*;
use seminaive_fixpoint::Variable;
use std::collections::BTreeSet;

proptest! {
    #[test]
    fn settled_batches_shrink_geometrically(
        batches in prop::collection::vec(
            prop::collection::vec(any::<u16>(), 0..40),
            1..20,
        ),
    ) {
        let mut numbers: Variable<u16> = Variable::new("numbers");

        for batch in &batches {
            numbers.insert(batch.clone());
            numbers.advance();

            // Each settled batch dwarfs its successor, which bounds
            // the list length logarithmically.
            for pair in numbers.settled().windows(2) {
                prop_assert!(pair[0].len() > 2 * pair[1].len());
            }

            for settled in numbers.settled() {
                for tuple in numbers.fresh().iter() {
                    prop_assert!(!settled.contains(tuple));
                }
            }
        }
    }

    #[test]
    fn complete_returns_union_of_inserts(
        batches in prop::collection::vec(
            prop::collection::vec(any::<u8>(), 0..30),
            0..10,
        ),
    ) {
        let mut numbers: Variable<u8> = Variable::new("numbers");
        let mut expected = BTreeSet::new();

        for batch in &batches {
            expected.extend(batch.iter().copied());
            numbers.insert(batch.clone());
            numbers.advance();
        }

        // No draining advance: `complete` must pick up whatever the
        // last round left in the fresh tier.
        let flattened = numbers.complete();
        prop_assert!(flattened.iter().copied().eq(expected.iter().copied()));
    }
}
