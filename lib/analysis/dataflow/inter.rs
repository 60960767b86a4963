//! A worklist solver for interprocedural dataflow problems.
//!
//! An interprocedural CFG links the CFGs of individual methods: call-site
//! nodes are connected to callee entry nodes and callee exit nodes back to
//! return-site nodes. Every edge is classified, and the analysis supplies a
//! transfer function *per edge* in addition to the per-node transfer - a
//! call edge typically kills facts about the caller's locals, and a
//! call-to-return edge carries them around the callee.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt::Debug;

use crate::analysis::dataflow::DataflowResult;
use crate::graph::{Edge, Graph, Vertex};
use crate::Error;

/// The classification of an edge in an interprocedural CFG.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum IcfgEdgeKind {
    /// An intraprocedural flow edge.
    #[default]
    Normal,
    /// From a call site to the entry of a callee.
    Call,
    /// From a call site to its return site, around the callee.
    CallToReturn,
    /// From the exit of a callee back to a return site.
    Return,
}

/// An edge in an interprocedural CFG.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct IcfgEdge {
    head: usize,
    tail: usize,
    kind: IcfgEdgeKind,
}

impl IcfgEdge {
    pub fn new(head: usize, tail: usize, kind: IcfgEdgeKind) -> IcfgEdge {
        IcfgEdge { head, tail, kind }
    }

    pub fn kind(&self) -> IcfgEdgeKind {
        self.kind
    }
}

impl Edge for IcfgEdge {
    fn head(&self) -> usize {
        self.head
    }
    fn tail(&self) -> usize {
        self.tail
    }
    fn dot_label(&self) -> String {
        format!("{:?}", self.kind)
    }
}

/// An interprocedural control-flow graph with classified edges and the
/// entry nodes of the program's entry methods.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Icfg<V: Vertex> {
    graph: Graph<V, IcfgEdge>,
    entries: BTreeSet<usize>,
}

impl<V: Vertex> Icfg<V> {
    pub fn new() -> Icfg<V> {
        Icfg {
            graph: Graph::new(),
            entries: BTreeSet::new(),
        }
    }

    /// Returns the underlying graph
    pub fn graph(&self) -> &Graph<V, IcfgEdge> {
        &self.graph
    }

    /// Adds a node to this `Icfg`.
    pub fn add_node(&mut self, node: V) -> Result<(), Error> {
        self.graph.insert_vertex(node)
    }

    /// Adds a classified edge between two nodes of this `Icfg`.
    pub fn add_edge(&mut self, head: usize, tail: usize, kind: IcfgEdgeKind) -> Result<(), Error> {
        self.graph.insert_edge(IcfgEdge::new(head, tail, kind))
    }

    /// Marks a node as the entry node of an entry method.
    pub fn add_entry(&mut self, node: usize) -> Result<(), Error> {
        if !self.graph.has_vertex(node) {
            return Err(Error::GraphVertexNotFound(node));
        }
        self.entries.insert(node);
        Ok(())
    }

    /// The entry nodes of the program's entry methods.
    pub fn entries(&self) -> &BTreeSet<usize> {
        &self.entries
    }
}

/// An interprocedural dataflow problem: per-node transfer plus a transfer
/// function for each classified edge.
pub trait InterDataflowAnalysis<V: Vertex> {
    type Fact: Clone + Debug + PartialEq;

    /// The fact holding at the entry of an entry method.
    fn boundary_fact(&self) -> Self::Fact;

    /// The initial fact for every other node.
    fn initial_fact(&self) -> Self::Fact;

    /// Meets `fact` into `target`. Must be commutative, associative and
    /// idempotent.
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// Computes the OUT fact from the IN fact at `node`, returning true
    /// iff the OUT fact changed.
    fn transfer_node(&self, node: &V, input: &Self::Fact, output: &mut Self::Fact) -> bool;

    /// Transfers a fact across `edge`, e.g. killing caller locals on a
    /// call edge.
    fn transfer_edge(&self, edge: &IcfgEdge, fact: &Self::Fact) -> Self::Fact;
}

/// Solves an interprocedural dataflow problem over `icfg` to a fixpoint.
///
/// Entry nodes are seeded with the boundary fact, which is never discarded:
/// incoming facts are met into a node's existing IN fact. A node's IN is
/// the meet over each incoming edge of the edge-transferred OUT fact of
/// that edge's source.
pub fn solve_interprocedural<A, V>(
    analysis: &A,
    icfg: &Icfg<V>,
) -> Result<DataflowResult<A::Fact>, Error>
where
    A: InterDataflowAnalysis<V>,
    V: Vertex,
{
    if icfg.entries().is_empty() {
        return Err("interprocedural CFG has no entry nodes".into());
    }

    let mut result = DataflowResult::new();
    for node in icfg.graph().vertices() {
        if icfg.entries().contains(&node.index()) {
            result.set_in_fact(node.index(), analysis.boundary_fact());
        } else {
            result.set_in_fact(node.index(), analysis.initial_fact());
        }
        result.set_out_fact(node.index(), analysis.initial_fact());
    }

    let mut worklist: VecDeque<usize> = icfg.graph().vertex_indices().into_iter().collect();

    while let Some(index) = worklist.pop_front() {
        trace!("solve_interprocedural: node {}", index);

        let mut in_fact = result.in_fact(index).unwrap().clone();
        for edge in icfg.graph().edges_in(index)? {
            let transferred =
                analysis.transfer_edge(edge, result.out_fact(edge.head()).unwrap());
            analysis.meet_into(&transferred, &mut in_fact);
        }

        let node = icfg.graph().vertex(index)?;
        let mut out_fact = result.out_fact(index).unwrap().clone();
        let changed = analysis.transfer_node(node, &in_fact, &mut out_fact);

        result.set_in_fact(index, in_fact);
        result.set_out_fact(index, out_fact);

        if changed {
            for successor in icfg.graph().successor_indices(index)? {
                worklist.push_back(successor);
            }
        }
    }

    debug!(
        "solve_interprocedural: fixpoint over {} nodes",
        icfg.graph().num_vertices()
    );
    Ok(result)
}
