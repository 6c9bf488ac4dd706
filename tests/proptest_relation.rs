//! Property tests for relation construction and merging: any way of
//! building a relation from the same multiset of tuples must yield
//! the same sequence, and `merge` must behave like set union.
use proptest::prelude::*;
use seminaive_fixpoint::Relation;
use std::collections::BTreeSet;

proptest! {
    #[test]
    fn construction_is_canonical(
        mut tuples in prop::collection::vec(any::<(u8, u8)>(), 0..64),
    ) {
        let as_set: BTreeSet<(u8, u8)> = tuples.iter().copied().collect();
        let relation: Relation<(u8, u8)> = tuples.clone().into();

        prop_assert_eq!(relation.len(), as_set.len());
        prop_assert!(relation.iter().copied().eq(as_set.iter().copied()));

        // Reordering and duplicating the input changes nothing.
        tuples.reverse();
        let mut doubled = tuples.clone();
        doubled.extend(tuples.iter().copied());
        let rebuilt: Relation<(u8, u8)> = doubled.into();
        prop_assert_eq!(relation, rebuilt);
    }

    #[test]
    fn merge_is_set_union(
        lhs in prop::collection::vec(any::<u16>(), 0..64),
        rhs in prop::collection::vec(any::<u16>(), 0..64),
    ) {
        let union: BTreeSet<u16> = lhs.iter().chain(rhs.iter()).copied().collect();

        let lhs: Relation<u16> = lhs.into();
        let rhs: Relation<u16> = rhs.into();
        let merged = lhs.merge(rhs);

        prop_assert!(merged.iter().copied().eq(union.iter().copied()));
    }

    #[test]
    fn merge_commutes_and_associates(
        a in prop::collection::vec(any::<u8>(), 0..32),
        b in prop::collection::vec(any::<u8>(), 0..32),
        c in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let a: Relation<u8> = a.into();
        let b: Relation<u8> = b.into();
        let c: Relation<u8> = c.into();

        prop_assert_eq!(
            a.clone().merge(b.clone()),
            b.clone().merge(a.clone())
        );
        prop_assert_eq!(
            a.clone().merge(b.clone()).merge(c.clone()),
            a.merge(b.merge(c))
        );
    }

    #[test]
    fn merge_is_idempotent(tuples in prop::collection::vec(any::<u8>(), 0..64)) {
        let relation: Relation<u8> = tuples.into();
        prop_assert_eq!(relation.clone().merge(relation.clone()), relation);
    }
}
