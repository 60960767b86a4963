use serde::{Deserialize, Serialize};

use crate::graph::{Graph, NullEdge, Vertex};
use crate::Error;

/// A control-flow graph of one method: a directed graph of nodes with a
/// designated entry and a designated exit.
///
/// `Cfg` does not construct itself from a method body; the caller decides
/// what a node is (usually one statement) and wires the edges.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Cfg<V: Vertex> {
    graph: Graph<V, NullEdge>,
    entry: Option<usize>,
    exit: Option<usize>,
}

impl<V: Vertex> Cfg<V> {
    pub fn new() -> Cfg<V> {
        Cfg {
            graph: Graph::new(),
            entry: None,
            exit: None,
        }
    }

    /// Returns the underlying graph
    pub fn graph(&self) -> &Graph<V, NullEdge> {
        &self.graph
    }

    /// Adds a node to this `Cfg`.
    pub fn add_node(&mut self, node: V) -> Result<(), Error> {
        self.graph.insert_vertex(node)
    }

    /// Adds a flow edge between two nodes of this `Cfg`.
    pub fn add_edge(&mut self, head: usize, tail: usize) -> Result<(), Error> {
        self.graph.insert_edge(NullEdge::new(head, tail))
    }

    /// Sets the entry node for this `Cfg` to the given node index.
    pub fn set_entry(&mut self, entry: usize) -> Result<(), Error> {
        if !self.graph.has_vertex(entry) {
            return Err("Index does not exist for set_entry".into());
        }
        self.entry = Some(entry);
        Ok(())
    }

    /// Sets the exit node for this `Cfg` to the given node index.
    pub fn set_exit(&mut self, exit: usize) -> Result<(), Error> {
        if !self.graph.has_vertex(exit) {
            return Err("Index does not exist for set_exit".into());
        }
        self.exit = Some(exit);
        Ok(())
    }

    /// The entry node index for this `Cfg`.
    pub fn entry(&self) -> Option<usize> {
        self.entry
    }

    /// The exit node index for this `Cfg`.
    pub fn exit(&self) -> Option<usize> {
        self.exit
    }
}
