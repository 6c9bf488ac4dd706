//! Facts (initial or derived) are stored as sorted, duplicate-free
//! sequences of tuples.  Everything downstream leans on that one
//! invariant: the merge-join walks two relations with cursors instead
//! of building hash indices, membership probes gallop forward instead
//! of scanning, and deduplication falls out of an ordinary linear
//! merge.
//!
//! Relations are immutable once built.  Growth happens by constructing
//! a new relation (usually with `merge`) and letting the old ones go;
//! there is no shared mutable state to reason about, and a `Relation`
//! moves between tiers of a `Variable` by plain value ownership.
use std::cmp::Ordering;
use std::iter::FromIterator;

/// An immutable, strictly increasing (thus duplicate-free) sequence
/// of tuples, ordered by the tuple type's total order.
///
/// The tuple type only needs `Ord`; relations of non-`Clone` tuples
/// work fine, which keeps accidental deep copies out of inner loops.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Relation<Tuple: Ord> {
    elements: Vec<Tuple>,
}

impl<Tuple: Ord> Relation<Tuple> {
    /// Returns a relation with no tuples.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Wraps a vector that is already strictly increasing.  The
    /// caller is responsible for the invariant; we only spot-check it
    /// in debug builds.
    pub(crate) fn from_sorted_vec(elements: Vec<Tuple>) -> Self {
        debug_assert!(elements.windows(2).all(|pair| pair[0] < pair[1]));
        Self { elements }
    }

    /// Returns the canonical union of `self` and `other`: a single
    /// linear merge pass, dropping one copy of any tuple present in
    /// both inputs.
    ///
    /// The result is the same sorted, deduplicated sequence whichever
    /// way the arguments are ordered or associated.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        // Unions against an empty side show up constantly (fresh
        // accumulators start empty); skip the copy.
        if self.is_empty() {
            return other;
        }

        if other.is_empty() {
            return self;
        }

        let mut merged = Vec::with_capacity(self.elements.len() + other.elements.len());
        let mut lhs = self.elements.into_iter();
        let mut rhs = other.elements.into_iter();

        let mut left = lhs.next();
        let mut right = rhs.next();
        loop {
            match (left, right) {
                (Some(x), Some(y)) => match x.cmp(&y) {
                    Ordering::Less => {
                        merged.push(x);
                        left = lhs.next();
                        right = Some(y);
                    }
                    Ordering::Greater => {
                        merged.push(y);
                        left = Some(x);
                        right = rhs.next();
                    }
                    Ordering::Equal => {
                        merged.push(x);
                        left = lhs.next();
                        right = rhs.next();
                    }
                },
                (Some(x), None) => {
                    merged.push(x);
                    merged.extend(lhs);
                    break;
                }
                (None, Some(y)) => {
                    merged.push(y);
                    merged.extend(rhs);
                    break;
                }
                (None, None) => break,
            }
        }

        Self::from_sorted_vec(merged)
    }

    /// Returns the number of tuples in the relation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true iff the relation holds no tuple.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns an iterator over the tuples, in order.
    pub fn iter(&self) -> std::slice::Iter<Tuple> {
        self.elements.iter()
    }

    /// Unwraps the underlying (sorted, deduplicated) vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<Tuple> {
        self.elements
    }
}

impl<Tuple: Ord> From<Vec<Tuple>> for Relation<Tuple> {
    fn from(mut elements: Vec<Tuple>) -> Self {
        elements.sort_unstable();
        elements.dedup();
        Self { elements }
    }
}

impl<Tuple: Ord> FromIterator<Tuple> for Relation<Tuple> {
    fn from_iter<I: IntoIterator<Item = Tuple>>(tuples: I) -> Self {
        tuples.into_iter().collect::<Vec<_>>().into()
    }
}

impl<Tuple: Ord> std::ops::Deref for Relation<Tuple> {
    type Target = [Tuple];

    fn deref(&self) -> &[Tuple] {
        &self.elements
    }
}

impl<'a, Tuple: Ord> IntoIterator for &'a Relation<Tuple> {
    type Item = &'a Tuple;
    type IntoIter = std::slice::Iter<'a, Tuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<Tuple: Ord> IntoIterator for Relation<Tuple> {
    type Item = Tuple;
    type IntoIter = std::vec::IntoIter<Tuple>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

#[test]
fn test_construction_canonicalises() {
    // Out of order, with duplicates: the result is the sorted set.
    let relation: Relation<u32> = vec![5, 1, 3, 1, 5, 5, 2].into();
    assert_eq!(&relation[..], &[1, 2, 3, 5]);

    let collected: Relation<u32> = [4u32, 4, 0].iter().copied().collect();
    assert_eq!(&collected[..], &[0, 4]);

    assert!(Relation::<u32>::empty().is_empty());
    assert_eq!(Relation::<u32>::empty().len(), 0);
}

#[test]
fn test_merge_is_canonical_union() {
    let lhs: Relation<u32> = vec![1, 3, 5].into();
    let rhs: Relation<u32> = vec![2, 3, 6].into();

    let merged = lhs.merge(rhs);
    assert_eq!(&merged[..], &[1, 2, 3, 5, 6]);
}

#[test]
fn test_merge_commutes_and_associates() {
    let make = |tuples: &[u32]| -> Relation<u32> { tuples.to_vec().into() };

    let (a, b, c) = (make(&[1, 4, 7]), make(&[2, 4, 8]), make(&[1, 8, 9]));

    assert_eq!(a.clone().merge(b.clone()), b.clone().merge(a.clone()));
    assert_eq!(
        a.clone().merge(b.clone()).merge(c.clone()),
        a.merge(b.merge(c))
    );
}

#[test]
fn test_merge_idempotent() {
    let relation: Relation<u32> = vec![1, 2, 3].into();
    assert_eq!(relation.clone().merge(relation.clone()), relation);
}

#[test]
fn test_merge_empty_sides() {
    let relation: Relation<u32> = vec![1, 2].into();

    assert_eq!(relation.clone().merge(Relation::empty()), relation);
    assert_eq!(Relation::empty().merge(relation.clone()), relation);
    assert!(Relation::<u32>::empty()
        .merge(Relation::empty())
        .is_empty());
}

#[test]
fn test_merge_without_clone() {
    // `merge` must work for tuples that only implement `Ord`.
    #[derive(Debug, Eq, Ord, PartialEq, PartialOrd)]
    struct Opaque(u64);

    let lhs: Relation<Opaque> = vec![Opaque(1), Opaque(3)].into();
    let rhs: Relation<Opaque> = vec![Opaque(2), Opaque(3)].into();

    let merged = lhs.merge(rhs);
    assert_eq!(
        merged.into_vec(),
        vec![Opaque(1), Opaque(2), Opaque(3)]
    );
}
