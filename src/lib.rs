//! The semi-naive fixpoint core of a minimal Datalog evaluator.
//!
//! Facts are tuples, relations are sorted duplicate-free sequences of
//! tuples, and rules are pairwise equi-joins.  Evaluation repeatedly
//! applies every rule and folds the derived facts back into the
//! inputs until nothing new appears.  Doing that naively re-derives
//! every known fact every round; the point of this crate is to never
//! reprocess a fact.  Each [`Variable`] splits its tuples into
//! settled, fresh and pending tiers, rule applications only look at
//! combinations involving a fresh side, and an amortized
//! consolidation scheme keeps the settled tier cheap to maintain and
//! cheap to probe.
//!
//! The driving loop belongs to the caller, which owns every variable
//! outright; see [`fixpoint`] for the round protocol.  Computing the
//! nodes reachable from a seed:
//!
//! ```
//! use seminaive_fixpoint::{fixpoint, join, Relation, Variable};
//!
//! // reach(x, z) <- reach(x, y), edge(y, z)
//! let edges: Relation<(u32, u32)> = vec![(0, 1), (1, 2), (2, 3)].into();
//!
//! let mut reach: Variable<(u32, u32)> = Variable::new("reach");
//! let mut by_dst: Variable<(u32, u32)> = Variable::new("reach_by_dst");
//! reach.insert(vec![(0, 1), (1, 2), (2, 3)]);
//!
//! loop {
//!     // Re-key reachability by destination, extend it with edges.
//!     join::map_into(&reach, &mut by_dst, |&(src, dst)| (dst, src));
//!     let extended = join::join_relation(&by_dst, &edges, |_mid, &src, &dst| (src, dst));
//!     reach.insert(extended);
//!
//!     if !fixpoint::advance_round(&mut [&mut reach, &mut by_dst]) {
//!         break;
//!     }
//! }
//!
//! assert_eq!(reach.complete().len(), 6);
//! ```
//!
//! The core is single-threaded and does no I/O; rule sets must be
//! expressible as repeated binary joins over finite tuple domains.
//! There is no planner, stratification, negation or aggregation here,
//! and nothing checks termination for infinite domains.

pub mod fixpoint;
pub mod gallop;
pub mod join;
pub mod relation;
pub mod variable;

pub use fixpoint::Frontier;
pub use relation::Relation;
pub use variable::Variable;
