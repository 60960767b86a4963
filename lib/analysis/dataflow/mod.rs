//! Generic worklist solvers for monotone dataflow problems.
//!
//! A dataflow problem is supplied as an implementation of
//! [`DataflowAnalysis`]: a fact type forming a finite-height lattice, a
//! `meet` operator, and a transfer function per node. [`solve_forward`]
//! and [`solve_backward`] drive the problem to a fixpoint over a [`Cfg`]
//! and hand back the per-node facts as a [`DataflowResult`].
//!
//! The fixpoint is reached because facts only ever move up the lattice:
//! `meet` must be commutative, associative and idempotent, and `transfer`
//! must report a change exactly when its output fact actually changed.
//! Worklist order is unspecified; the policy's `meet` and `transfer` must
//! be functions of their inputs so the final facts are order-independent.

mod cfg;
mod inter;
mod solver;

pub use self::cfg::Cfg;
pub use self::inter::{solve_interprocedural, Icfg, IcfgEdge, IcfgEdgeKind, InterDataflowAnalysis};
pub use self::solver::{solve_backward, solve_forward};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::graph::Vertex;

/// A dataflow problem: facts, the meet operator, and the transfer function.
pub trait DataflowAnalysis<V: Vertex> {
    type Fact: Clone + Debug + PartialEq;

    /// The fact holding at the boundary, i.e. at the entry node of a
    /// forward problem or the exit node of a backward one.
    fn boundary_fact(&self) -> Self::Fact;

    /// The initial fact for every non-boundary node.
    fn initial_fact(&self) -> Self::Fact;

    /// Meets `fact` into `target`. Must be commutative, associative and
    /// idempotent.
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// Computes `output` from `input` at `node`, returning true iff
    /// `output` changed.
    ///
    /// The solver decides which side is which: a forward solve calls this
    /// with `input` = IN and `output` = OUT, a backward solve with
    /// `input` = OUT and `output` = IN.
    fn transfer(&self, node: &V, input: &Self::Fact, output: &mut Self::Fact) -> bool;
}

/// Stable IN/OUT facts for every node, produced by a solver.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DataflowResult<Fact> {
    in_facts: BTreeMap<usize, Fact>,
    out_facts: BTreeMap<usize, Fact>,
}

impl<Fact> DataflowResult<Fact> {
    pub(crate) fn new() -> DataflowResult<Fact> {
        DataflowResult {
            in_facts: BTreeMap::new(),
            out_facts: BTreeMap::new(),
        }
    }

    /// The fact holding just before `node`.
    pub fn in_fact(&self, node: usize) -> Option<&Fact> {
        self.in_facts.get(&node)
    }

    /// The fact holding just after `node`.
    pub fn out_fact(&self, node: usize) -> Option<&Fact> {
        self.out_facts.get(&node)
    }

    pub(crate) fn set_in_fact(&mut self, node: usize, fact: Fact) {
        self.in_facts.insert(node, fact);
    }

    pub(crate) fn set_out_fact(&mut self, node: usize, fact: Fact) {
        self.out_facts.insert(node, fact);
    }
}
