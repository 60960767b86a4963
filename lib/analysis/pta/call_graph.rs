use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::analysis::pta::{CsCallSite, CsMethod};
use crate::ir::{CallKind, MethodId};

/// An edge in a context-sensitive call graph: one context-qualified call
/// site resolved to one context-qualified callee.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CsCallEdge {
    kind: CallKind,
    call_site: CsCallSite,
    callee: CsMethod,
}

impl CsCallEdge {
    pub fn new(kind: CallKind, call_site: CsCallSite, callee: CsMethod) -> CsCallEdge {
        CsCallEdge {
            kind,
            call_site,
            callee,
        }
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn call_site(&self) -> CsCallSite {
        self.call_site
    }

    pub fn callee(&self) -> CsMethod {
        self.callee
    }
}

/// A call graph over context-qualified methods, grown on the fly by the
/// points-to engine.
///
/// A method becomes reachable at most once per context, and duplicate
/// edges collapse; both additions report whether they changed anything.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CsCallGraph {
    entries: Vec<CsMethod>,
    reachable: Vec<CsMethod>,
    reachable_set: FxHashSet<CsMethod>,
    edges: Vec<CsCallEdge>,
    edge_set: FxHashSet<(CsCallSite, CsMethod)>,
}

impl CsCallGraph {
    pub fn new() -> CsCallGraph {
        CsCallGraph::default()
    }

    /// Marks a context-qualified method as a program entry point.
    pub fn add_entry_method(&mut self, method: CsMethod) {
        self.entries.push(method);
    }

    pub fn entry_methods(&self) -> &[CsMethod] {
        &self.entries
    }

    /// Marks a context-qualified method reachable. Returns false if it
    /// already was.
    pub fn add_reachable_method(&mut self, method: CsMethod) -> bool {
        if !self.reachable_set.insert(method) {
            return false;
        }
        self.reachable.push(method);
        true
    }

    pub fn is_reachable(&self, method: CsMethod) -> bool {
        self.reachable_set.contains(&method)
    }

    /// True if `method` is reachable under any context.
    pub fn is_reachable_method(&self, method: MethodId) -> bool {
        self.reachable
            .iter()
            .any(|reachable| reachable.method == method)
    }

    /// Reachable context-qualified methods, in discovery order.
    pub fn reachable_methods(&self) -> &[CsMethod] {
        &self.reachable
    }

    /// Adds a call edge. Returns false if the edge already existed.
    pub fn add_edge(&mut self, edge: CsCallEdge) -> bool {
        if !self.edge_set.insert((edge.call_site(), edge.callee())) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn edges(&self) -> &[CsCallEdge] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// The callees one context-qualified call site resolves to.
    pub fn callees_of(&self, call_site: CsCallSite) -> Vec<CsMethod> {
        self.edges
            .iter()
            .filter(|edge| edge.call_site() == call_site)
            .map(|edge| edge.callee())
            .collect()
    }

    /// All edges whose call site lies in `caller`, under any context.
    pub fn edges_out_of(&self, caller: MethodId) -> Vec<&CsCallEdge> {
        self.edges
            .iter()
            .filter(|edge| edge.call_site().site.method() == caller)
            .collect()
    }

    /// All edges resolving to `callee`, under any context.
    pub fn edges_into(&self, callee: MethodId) -> Vec<&CsCallEdge> {
        self.edges
            .iter()
            .filter(|edge| edge.callee().method == callee)
            .collect()
    }
}
