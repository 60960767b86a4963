//! Call graphs and class-hierarchy call resolution.
//!
//! [`CallGraph`] is the result structure: entry methods, reachable
//! methods, and resolved call edges, queryable from either end.
//! [`ChaBuilder`] populates one using class-hierarchy analysis, the
//! cheapest whole-program call-resolution strategy: a call site's
//! candidates are determined entirely by the static type of its target
//! reference and the subtype hierarchy below it.

mod cha;

pub use self::cha::{dispatch, resolve, ChaBuilder};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ir::{CallKind, MethodId, StmtRef};

/// An edge in a call graph: one call site resolved to one callee.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CallEdge {
    kind: CallKind,
    call_site: StmtRef,
    callee: MethodId,
}

impl CallEdge {
    pub fn new(kind: CallKind, call_site: StmtRef, callee: MethodId) -> CallEdge {
        CallEdge {
            kind,
            call_site,
            callee,
        }
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn call_site(&self) -> StmtRef {
        self.call_site
    }

    pub fn callee(&self) -> MethodId {
        self.callee
    }

    /// The method containing the call site.
    pub fn caller(&self) -> MethodId {
        self.call_site.method()
    }
}

/// A whole-program call graph.
///
/// A method becomes reachable at most once, and duplicate edges collapse:
/// both additions report whether they changed the graph, which is what
/// lets the builders drive themselves to a fixpoint.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CallGraph {
    entries: BTreeSet<MethodId>,
    reachable: Vec<MethodId>,
    reachable_set: FxHashSet<MethodId>,
    edges: Vec<CallEdge>,
    edge_set: FxHashSet<(StmtRef, MethodId)>,
}

impl CallGraph {
    pub fn new() -> CallGraph {
        CallGraph::default()
    }

    /// Marks a method as a program entry point.
    pub fn add_entry_method(&mut self, method: MethodId) {
        self.entries.insert(method);
    }

    /// The program entry points.
    pub fn entry_methods(&self) -> &BTreeSet<MethodId> {
        &self.entries
    }

    /// Marks a method reachable. Returns false if it already was.
    pub fn add_reachable_method(&mut self, method: MethodId) -> bool {
        if !self.reachable_set.insert(method) {
            return false;
        }
        self.reachable.push(method);
        true
    }

    pub fn is_reachable(&self, method: MethodId) -> bool {
        self.reachable_set.contains(&method)
    }

    /// Reachable methods, in the order they were discovered.
    pub fn reachable_methods(&self) -> &[MethodId] {
        &self.reachable
    }

    /// Adds a call edge. Returns false if the edge already existed.
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        if !self.edge_set.insert((edge.call_site(), edge.callee())) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// The callees one call site resolves to.
    pub fn callees_of(&self, call_site: StmtRef) -> Vec<MethodId> {
        self.edges
            .iter()
            .filter(|edge| edge.call_site() == call_site)
            .map(|edge| edge.callee())
            .collect()
    }

    /// All edges whose call site lies in `caller`.
    pub fn edges_out_of(&self, caller: MethodId) -> Vec<&CallEdge> {
        self.edges
            .iter()
            .filter(|edge| edge.caller() == caller)
            .collect()
    }

    /// All edges resolving to `callee`.
    pub fn edges_into(&self, callee: MethodId) -> Vec<&CallEdge> {
        self.edges
            .iter()
            .filter(|edge| edge.callee() == callee)
            .collect()
    }
}
