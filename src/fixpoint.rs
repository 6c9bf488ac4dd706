//! The evaluation loop itself stays in caller code: the caller owns
//! every variable, applies its rules with shared borrows, and then
//! closes the round.  This module only packages the round protocol,
//! which is short but easy to get subtly wrong:
//!
//!  1. apply every rule (the order does not matter; derived batches
//!     accumulate in pending tiers and nobody reads those until the
//!     round closes);
//!  2. advance every variable, unconditionally; skipping a
//!     "quiet-looking" variable would leave promoted-but-unoffered
//!     tuples behind;
//!  3. stop once an entire round of advances reports no fresh tuples
//!     anywhere.
//!
//! Termination follows from monotonicity: promotion discards
//! everything already settled, so each live round strictly consumes
//! the finite space of not-yet-derived tuples.  Once a round leaves
//! every fresh tier empty, rule applications can only re-derive
//! settled tuples, and no later round can change anything.
//!
//! Everything here is single-threaded.  A partitioned driver can run
//! rule applications for disjoint key ranges concurrently (variables
//! share no state), but it must keep a barrier between "all rules of
//! round k" and "all advances of round k"; the advance mutates the
//! settled/fresh split that concurrent rule applications read.
use crate::variable::Variable;

/// The type-erased face of a `Variable`, letting one driver loop
/// close a round over variables of different tuple shapes.
pub trait Frontier {
    /// Ends the round for this variable; returns whether it still
    /// has fresh tuples to offer.  See `Variable::advance`.
    fn advance(&mut self) -> bool;

    /// Diagnostic name.
    fn name(&self) -> &str;
}

impl<Tuple: Ord> Frontier for Variable<Tuple> {
    fn advance(&mut self) -> bool {
        Variable::advance(self)
    }

    fn name(&self) -> &str {
        Variable::name(self)
    }
}

/// Closes one fixpoint round: advances every variable (all of them,
/// even if an earlier one already reported progress) and returns
/// whether any still carries fresh tuples.  A `false` return means
/// global convergence: no rule application can derive anything new,
/// and the caller should stop iterating.
pub fn advance_round(variables: &mut [&mut dyn Frontier]) -> bool {
    let mut any_fresh = false;
    for variable in variables.iter_mut() {
        let fresh = variable.advance();
        if fresh {
            log::debug!("round still live: {} has fresh tuples", variable.name());
        }

        any_fresh |= fresh;
    }

    any_fresh
}

#[test]
fn test_transitive_closure_converges() {
    use crate::join;
    use crate::relation::Relation;

    // nodes(y) <- nodes(x), edges(x, y), over a 3-cycle with a
    // single seed: every node becomes reachable, then nothing else
    // does.
    let edges: Relation<(u32, u32)> = vec![(0, 1), (1, 2), (2, 0)].into();
    let mut nodes: Variable<(u32, ())> = Variable::new("nodes");
    nodes.insert(vec![(0u32, ())]);

    let mut rounds = 0;
    loop {
        let reached = join::join_relation(&nodes, &edges, |_from, &(), &to| (to, ()));
        nodes.insert(reached);

        if !advance_round(&mut [&mut nodes]) {
            break;
        }

        rounds += 1;
        assert!(rounds < 10, "no convergence on a 3-node cycle");
    }

    // One more round after convergence must change nothing.
    let reached = join::join_relation(&nodes, &edges, |_from, &(), &to| (to, ()));
    nodes.insert(reached);
    assert!(!advance_round(&mut [&mut nodes]));

    assert_eq!(&nodes.complete()[..], &[(0, ()), (1, ()), (2, ())]);
}

#[test]
fn test_advance_round_advances_every_variable() {
    let mut left: Variable<u32> = Variable::new("left");
    let mut right: Variable<(u32, char)> = Variable::new("right");

    left.insert(vec![1u32]);
    right.insert(vec![(1u32, 'a')]);

    // Both variables promote in the same round, even though the
    // first alone already decides the round's return value.
    assert!(advance_round(&mut [&mut left, &mut right]));
    assert_eq!(&left.fresh()[..], &[1]);
    assert_eq!(&right.fresh()[..], &[(1, 'a')]);

    assert!(!advance_round(&mut [&mut left, &mut right]));
    assert!(left.fresh().is_empty());
    assert!(right.fresh().is_empty());
}

#[test]
fn test_two_variable_pipeline() {
    use crate::join;

    // reach(x, z) <- reach(x, y), edge(y, z), with reach re-keyed by
    // destination through an intermediate variable.
    let edges: crate::relation::Relation<(u32, u32)> =
        vec![(0, 1), (1, 2), (1, 3)].into();
    let mut reach: Variable<(u32, u32)> = Variable::new("reach");
    let mut by_dst: Variable<(u32, u32)> = Variable::new("by_dst");

    reach.insert(vec![(0u32, 1u32), (1, 2), (1, 3)]);

    loop {
        join::map_into(&reach, &mut by_dst, |&(src, dst)| (dst, src));
        let extended = join::join_relation(&by_dst, &edges, |_mid, &src, &dst| (src, dst));
        reach.insert(extended);

        if !advance_round(&mut [&mut reach, &mut by_dst]) {
            break;
        }
    }

    assert_eq!(
        &reach.complete()[..],
        &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3)]
    );
}
