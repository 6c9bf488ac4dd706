//! A `Variable` is a monotonically growing set of tuples, structured
//! so that rule applications never reprocess a tuple they have
//! already seen.  The set is split in three tiers:
//!
//!  * `settled`: tuples that every rule has been offered at least
//!    once, stored as a short list of disjoint relations rather than
//!    one flat relation;
//!  * `fresh`: tuples promoted during the previous `advance`, known
//!    to be absent from `settled`, and not yet offered to rules as
//!    new stimulus;
//!  * `pending`: raw candidate batches proposed by rule applications
//!    (or initial loading), not yet deduplicated against anything.
//!
//! Keeping `settled` as a list is what makes growth cheap.  Merging
//! every promotion into one big relation would cost O(N) per round;
//! instead, a promoted batch only absorbs the trailing batches that
//! are at most twice its size.  Every tuple then takes part in
//! O(log N) merges over the variable's lifetime, the list length
//! stays logarithmic in the total tuple count, and each batch on the
//! list is more than twice the size of its successor.
//!
//! A variable is owned by whoever drives the fixpoint; rule
//! applications read `settled` and `fresh` through shared borrows and
//! push derived batches into `pending` through the exclusive borrow.
//! Nothing here is shared or interiorly mutable.
use crate::gallop::gallop;
use crate::relation::Relation;

/// A mutable, tiered accumulator of tuples.
///
/// Tuples make a one-way trip through the tiers: `insert` appends to
/// `pending`, and each `advance` promotes `pending` to `fresh` (after
/// deduplication) and retires the previous `fresh` into `settled`.
/// The variable has converged once an `advance` leaves `fresh` empty.
pub struct Variable<Tuple: Ord> {
    name: String,
    settled: Vec<Relation<Tuple>>,
    fresh: Relation<Tuple>,
    pending: Vec<Relation<Tuple>>,
}

impl<Tuple: Ord> Variable<Tuple> {
    /// Returns a fresh, empty variable.  The name only serves
    /// diagnostics; nothing checks it for uniqueness.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            settled: Vec::new(),
            fresh: Relation::empty(),
            pending: Vec::new(),
        }
    }

    /// Returns the diagnostic name passed to `new`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Proposes `tuples` for inclusion.  The batch lands in `pending`
    /// and only becomes visible to rule applications after the next
    /// `advance`.  Inserting tuples that are already settled is
    /// wasteful but harmless; promotion drops them.
    pub fn insert(&mut self, tuples: impl Into<Relation<Tuple>>) {
        let relation = tuples.into();
        if !relation.is_empty() {
            self.pending.push(relation);
        }
    }

    /// The settled tier: disjoint relations, sizes decreasing by more
    /// than half from one batch to the next.
    #[must_use]
    pub fn settled(&self) -> &[Relation<Tuple>] {
        &self.settled
    }

    /// The fresh tier: tuples promoted by the previous `advance`,
    /// disjoint from every settled batch.
    #[must_use]
    pub fn fresh(&self) -> &Relation<Tuple> {
        &self.fresh
    }

    /// Ends a round for this variable: retires `fresh` into the
    /// settled list, then promotes the deduplicated union of
    /// `pending` into `fresh`.  Returns whether the new `fresh` tier
    /// is non-empty, i.e. whether this variable still has stimulus to
    /// offer on the next round.
    ///
    /// Call this once per variable per round, after every rule
    /// application of the round has run.
    pub fn advance(&mut self) -> bool {
        // Retire the previous fresh batch, absorbing trailing settled
        // batches until the next one is more than twice our size.
        if !self.fresh.is_empty() {
            let mut accumulator = std::mem::replace(&mut self.fresh, Relation::empty());
            while self
                .settled
                .last()
                .map_or(false, |last| last.len() <= 2 * accumulator.len())
            {
                let last = self
                    .settled
                    .pop()
                    .expect("the loop condition saw a last batch");
                accumulator = last.merge(accumulator);
            }

            self.settled.push(accumulator);
        }

        // Promote pending candidates: take their union, then drop
        // everything already settled.  The settled batches are
        // sorted, so one galloping cursor per batch suffices.
        let merged = match self.pending.pop() {
            None => Relation::empty(),
            Some(first) => self
                .pending
                .drain(..)
                .fold(first, |acc, batch| acc.merge(batch)),
        };

        let mut candidates = merged.into_vec();
        for settled in self.settled.iter() {
            if candidates.is_empty() {
                break;
            }

            let mut window = &settled[..];
            candidates.retain(|tuple| {
                window = gallop(window, |settled_tuple| settled_tuple < tuple);
                window.first() != Some(tuple)
            });
        }

        self.fresh = Relation::from_sorted_vec(candidates);

        log::trace!(
            "variable {}: {} settled in {} batches, {} fresh",
            self.name,
            self.settled.iter().map(Relation::len).sum::<usize>(),
            self.settled.len(),
            self.fresh.len()
        );

        !self.fresh.is_empty()
    }

    /// Flattens the variable into a single relation, consuming it.
    /// This is the terminal read once the driver has decided on
    /// global convergence; tuples still in `fresh` (a `complete`
    /// before the last `advance`) are included.
    ///
    /// Calling this with unpromoted `pending` batches is a driver
    /// bug, and asserts.
    #[must_use]
    pub fn complete(mut self) -> Relation<Tuple> {
        assert!(
            self.pending.is_empty(),
            "variable {} completed with unpromoted pending tuples",
            self.name
        );

        // Merge smallest-first: the settled list stores batches in
        // decreasing size order, so popping keeps the accumulator
        // small for as long as possible.
        let mut result = std::mem::replace(&mut self.fresh, Relation::empty());
        while let Some(batch) = self.settled.pop() {
            result = result.merge(batch);
        }

        result
    }
}

impl<Tuple: Ord> std::fmt::Debug for Variable<Tuple> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("name", &self.name)
            .field(
                "settled",
                &self.settled.iter().map(Relation::len).collect::<Vec<_>>(),
            )
            .field("fresh", &self.fresh.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[test]
fn test_insert_then_advance_promotes() {
    let mut numbers = Variable::new("numbers");

    numbers.insert(vec![3u32, 1, 2, 3]);
    assert!(numbers.fresh().is_empty());
    assert!(numbers.settled().is_empty());

    // First advance: candidates become fresh, deduplicated.
    assert!(numbers.advance());
    assert_eq!(&numbers.fresh()[..], &[1, 2, 3]);
    assert!(numbers.settled().is_empty());

    // Second advance: fresh settles, nothing new shows up.
    assert!(!numbers.advance());
    assert!(numbers.fresh().is_empty());
    assert_eq!(numbers.settled().len(), 1);
    assert_eq!(&numbers.settled()[0][..], &[1, 2, 3]);
}

#[test]
fn test_promotion_drops_settled_duplicates() {
    let mut numbers = Variable::new("numbers");

    numbers.insert(vec![1u32, 2, 3]);
    numbers.advance();
    numbers.advance();

    // Re-propose a settled tuple alongside new ones, across two
    // pending batches.
    numbers.insert(vec![2u32, 4]);
    numbers.insert(vec![4u32, 5]);
    assert!(numbers.advance());
    assert_eq!(&numbers.fresh()[..], &[4, 5]);

    // Proposing only settled tuples converges immediately.
    numbers.insert(vec![1u32, 5]);
    assert!(!numbers.advance());
    assert!(numbers.fresh().is_empty());
}

#[test]
fn test_fresh_and_settled_stay_disjoint() {
    let mut numbers: Variable<u32> = Variable::new("numbers");

    for round in 0..10u32 {
        // Overlapping windows of tuples: each round re-proposes half
        // of the previous round's batch.
        numbers.insert((4 * round..4 * (round + 1) + 2).collect::<Vec<_>>());
        numbers.advance();

        for settled in numbers.settled() {
            for tuple in numbers.fresh().iter() {
                assert!(!settled.contains(tuple));
            }
        }
    }
}

#[test]
fn test_settled_sizes_decrease_geometrically() {
    let mut numbers: Variable<u32> = Variable::new("numbers");

    let mut total = 0u32;
    for batch in 0..100u32 {
        numbers.insert((total..total + batch % 7 + 1).collect::<Vec<_>>());
        total += batch % 7 + 1;
        numbers.advance();

        for pair in numbers.settled().windows(2) {
            assert!(pair[0].len() > 2 * pair[1].len());
        }
    }

    // 700-ish tuples must live in a logarithmic number of batches.
    assert!(numbers.settled().len() <= 10);
}

#[test]
fn test_complete_includes_fresh() {
    let mut numbers = Variable::new("numbers");

    numbers.insert(vec![1u32, 2]);
    numbers.advance();
    numbers.insert(vec![3u32]);
    numbers.advance();

    // `fresh` is {3}, settled {1, 2}; both must be in the flattened
    // output.
    assert_eq!(&numbers.complete()[..], &[1, 2, 3]);
}

#[test]
#[should_panic(expected = "unpromoted pending tuples")]
fn test_complete_rejects_pending() {
    let mut numbers = Variable::new("numbers");

    numbers.insert(vec![1u32]);
    let _ = numbers.complete();
}

#[test]
fn test_advance_on_empty_variable() {
    let mut numbers: Variable<u32> = Variable::new("numbers");

    assert!(!numbers.advance());
    assert!(numbers.complete().is_empty());
}
