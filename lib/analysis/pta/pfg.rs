use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::analysis::pta::PointerId;

/// The pointer flow graph.
///
/// An edge from one pointer to another means "whatever the source points
/// to also flows to the target." The edge set is append-only and adding
/// an existing edge is a no-op.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PointerFlowGraph {
    successors: Vec<BTreeSet<PointerId>>,
}

impl PointerFlowGraph {
    pub fn new() -> PointerFlowGraph {
        PointerFlowGraph {
            successors: Vec::new(),
        }
    }

    /// Adds an edge. Returns false if the edge already existed.
    pub fn add_edge(&mut self, source: PointerId, target: PointerId) -> bool {
        if self.successors.len() <= source.index() {
            self.successors.resize_with(source.index() + 1, BTreeSet::new);
        }
        self.successors[source.index()].insert(target)
    }

    pub fn has_edge(&self, source: PointerId, target: PointerId) -> bool {
        self.successors
            .get(source.index())
            .map(|successors| successors.contains(&target))
            .unwrap_or(false)
    }

    /// The pointers that `pointer` flows into.
    pub fn successors_of(&self, pointer: PointerId) -> impl Iterator<Item = PointerId> + '_ {
        self.successors
            .get(pointer.index())
            .into_iter()
            .flatten()
            .cloned()
    }

    pub fn num_edges(&self) -> usize {
        self.successors
            .iter()
            .map(|successors| successors.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_edge_is_a_no_op() {
        let mut pfg = PointerFlowGraph::new();

        assert!(pfg.add_edge(PointerId(0), PointerId(1)));
        assert!(!pfg.add_edge(PointerId(0), PointerId(1)));
        assert_eq!(pfg.num_edges(), 1);
    }

    #[test]
    fn test_successors_of() {
        let mut pfg = PointerFlowGraph::new();
        pfg.add_edge(PointerId(0), PointerId(1));
        pfg.add_edge(PointerId(0), PointerId(2));

        let successors: Vec<PointerId> = pfg.successors_of(PointerId(0)).collect();
        assert_eq!(successors, vec![PointerId(1), PointerId(2)]);

        // a pointer with no outgoing edges has no successors
        assert_eq!(pfg.successors_of(PointerId(9)).count(), 0);
    }

    #[test]
    fn test_has_edge() {
        let mut pfg = PointerFlowGraph::new();
        pfg.add_edge(PointerId(0), PointerId(1));

        assert!(pfg.has_edge(PointerId(0), PointerId(1)));
        assert!(!pfg.has_edge(PointerId(1), PointerId(0)));
    }
}
