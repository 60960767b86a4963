//! Implements a directed graph.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use crate::Error;

pub trait Vertex: Clone + Debug {
    // The index of this vertex.
    fn index(&self) -> usize;
    // A string to display in dot graphviz format.
    fn dot_label(&self) -> String;
}

pub trait Edge: Clone + Debug {
    /// The index of the head vertex.
    fn head(&self) -> usize;
    /// The index of the tail vertex.
    fn tail(&self) -> usize;
    /// A string to display in dot graphviz format.
    fn dot_label(&self) -> String;
}

/// An empty edge for creating structures when edge data is not required
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct NullEdge {
    head: usize,
    tail: usize,
}

impl NullEdge {
    pub fn new(head: usize, tail: usize) -> NullEdge {
        NullEdge { head, tail }
    }
}

impl Edge for NullEdge {
    fn head(&self) -> usize {
        self.head
    }
    fn tail(&self) -> usize {
        self.tail
    }
    fn dot_label(&self) -> String {
        format!("{} -> {}", self.head, self.tail)
    }
}

/// A directed graph.
///
/// Vertices are keyed by their index. Edges are keyed by the indices of
/// their head and tail vertices, so at most one edge exists per ordered
/// vertex pair. Adjacency is held in ordered sets, which keeps iteration
/// order deterministic.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Graph<V: Vertex, E: Edge> {
    vertices: BTreeMap<usize, V>,
    edges: BTreeMap<(usize, usize), E>,
    successors: BTreeMap<usize, BTreeSet<usize>>,
    predecessors: BTreeMap<usize, BTreeSet<usize>>,
}

impl<V, E> Graph<V, E>
where
    V: Vertex,
    E: Edge,
{
    pub fn new() -> Graph<V, E> {
        Graph {
            vertices: BTreeMap::new(),
            edges: BTreeMap::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if the vertex with the given index exists in this graph
    pub fn has_vertex(&self, index: usize) -> bool {
        self.vertices.contains_key(&index)
    }

    /// Returns true if the edge with the given head and tail index exists in this graph
    pub fn has_edge(&self, head: usize, tail: usize) -> bool {
        self.edges.contains_key(&(head, tail))
    }

    /// Inserts a vertex into the graph.
    /// # Errors
    /// Error if the vertex already exists by index.
    pub fn insert_vertex(&mut self, v: V) -> Result<(), Error> {
        if self.vertices.contains_key(&v.index()) {
            return Err("duplicate vertex index".into());
        }
        self.vertices.insert(v.index(), v.clone());
        self.successors.insert(v.index(), BTreeSet::new());
        self.predecessors.insert(v.index(), BTreeSet::new());
        Ok(())
    }

    /// Inserts an edge into the graph.
    /// # Errors
    /// Error if either vertex does not exist, or the edge already exists.
    pub fn insert_edge(&mut self, edge: E) -> Result<(), Error> {
        if self.edges.contains_key(&(edge.head(), edge.tail())) {
            return Err("duplicate edge".into());
        }
        if !self.vertices.contains_key(&edge.head()) {
            return Err(Error::GraphVertexNotFound(edge.head()));
        }
        if !self.vertices.contains_key(&edge.tail()) {
            return Err(Error::GraphVertexNotFound(edge.tail()));
        }

        self.edges.insert((edge.head(), edge.tail()), edge.clone());
        self.successors
            .get_mut(&edge.head())
            .unwrap()
            .insert(edge.tail());
        self.predecessors
            .get_mut(&edge.tail())
            .unwrap()
            .insert(edge.head());

        Ok(())
    }

    /// Returns a vertex by index.
    pub fn vertex(&self, index: usize) -> Result<&V, Error> {
        self.vertices
            .get(&index)
            .ok_or(Error::GraphVertexNotFound(index))
    }

    /// Returns an edge by the indices of its head and tail vertices.
    pub fn edge(&self, head: usize, tail: usize) -> Result<&E, Error> {
        self.edges
            .get(&(head, tail))
            .ok_or(Error::GraphEdgeNotFound(head, tail))
    }

    /// Returns all vertices in this graph.
    pub fn vertices(&self) -> Vec<&V> {
        self.vertices.values().collect()
    }

    /// Returns the indices of all vertices in this graph.
    pub fn vertex_indices(&self) -> Vec<usize> {
        self.vertices.keys().cloned().collect()
    }

    /// Returns all edges in this graph.
    pub fn edges(&self) -> Vec<&E> {
        self.edges.values().collect()
    }

    /// Returns all edges into the vertex with the given index.
    pub fn edges_in(&self, index: usize) -> Result<Vec<&E>, Error> {
        if !self.vertices.contains_key(&index) {
            return Err(Error::GraphVertexNotFound(index));
        }
        Ok(self.predecessors[&index]
            .iter()
            .map(|predecessor| &self.edges[&(*predecessor, index)])
            .collect())
    }

    /// Returns all edges out of the vertex with the given index.
    pub fn edges_out(&self, index: usize) -> Result<Vec<&E>, Error> {
        if !self.vertices.contains_key(&index) {
            return Err(Error::GraphVertexNotFound(index));
        }
        Ok(self.successors[&index]
            .iter()
            .map(|successor| &self.edges[&(index, *successor)])
            .collect())
    }

    /// Returns all immediate successors of a vertex from the graph.
    pub fn successors(&self, index: usize) -> Result<Vec<&V>, Error> {
        if !self.vertices.contains_key(&index) {
            return Err(Error::GraphVertexNotFound(index));
        }
        Ok(self.successors[&index]
            .iter()
            .map(|index| self.vertices.get(index).unwrap())
            .collect())
    }

    /// Returns all immediate predecessors of a vertex from the graph.
    pub fn predecessors(&self, index: usize) -> Result<Vec<&V>, Error> {
        if !self.vertices.contains_key(&index) {
            return Err(Error::GraphVertexNotFound(index));
        }
        Ok(self.predecessors[&index]
            .iter()
            .map(|index| self.vertices.get(index).unwrap())
            .collect())
    }

    /// Returns the indices of all immediate successors of a vertex from the graph.
    pub fn successor_indices(&self, index: usize) -> Result<Vec<usize>, Error> {
        if !self.vertices.contains_key(&index) {
            return Err(Error::GraphVertexNotFound(index));
        }
        Ok(self.successors[&index].iter().cloned().collect())
    }

    /// Returns the indices of all immediate predecessors of a vertex from the graph.
    pub fn predecessor_indices(&self, index: usize) -> Result<Vec<usize>, Error> {
        if !self.vertices.contains_key(&index) {
            return Err(Error::GraphVertexNotFound(index));
        }
        Ok(self.predecessors[&index].iter().cloned().collect())
    }

    /// Returns a string in the graphviz format
    pub fn dot_graph(&self) -> String {
        let vertices = self
            .vertices
            .values()
            .map(|vertex| {
                let label = vertex.dot_label().replace('\n', "\\l");
                format!(
                    "{} [shape=\"box\", label=\"{}\"];",
                    vertex.index(),
                    label
                )
            })
            .collect::<Vec<String>>();

        let edges = self
            .edges
            .values()
            .map(|edge| {
                let label = edge.dot_label().replace('\n', "\\l");
                format!(
                    "{} -> {} [label=\"{}\"];",
                    edge.head(),
                    edge.tail(),
                    label
                )
            })
            .collect::<Vec<String>>();

        format!(
            "digraph G {{\n{}\n{}\n}}",
            vertices.join("\n"),
            edges.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Vertex for usize {
        fn index(&self) -> usize {
            *self
        }

        fn dot_label(&self) -> String {
            self.to_string()
        }
    }

    /**
     *           +--> 3 +-+
     *          /          \
     *         | +--> 4 +--+
     *         |/          |
     *         +           v
     * 1 +---> 2 <-------+ 5
     *         +
     *         |
     *         v
     *         6
     */
    fn create_test_graph() -> Graph<usize, NullEdge> {
        let mut graph = Graph::new();

        graph.insert_vertex(1).unwrap();
        graph.insert_vertex(2).unwrap();
        graph.insert_vertex(3).unwrap();
        graph.insert_vertex(4).unwrap();
        graph.insert_vertex(5).unwrap();
        graph.insert_vertex(6).unwrap();

        graph.insert_edge(NullEdge::new(1, 2)).unwrap();
        graph.insert_edge(NullEdge::new(2, 3)).unwrap();
        graph.insert_edge(NullEdge::new(2, 4)).unwrap();
        graph.insert_edge(NullEdge::new(2, 6)).unwrap();
        graph.insert_edge(NullEdge::new(3, 5)).unwrap();
        graph.insert_edge(NullEdge::new(4, 5)).unwrap();
        graph.insert_edge(NullEdge::new(5, 2)).unwrap();

        graph
    }

    #[test]
    fn test_successors() {
        let graph = create_test_graph();

        assert_eq!(graph.successors(2).unwrap(), vec![&3, &4, &6]);

        let empty_vertex_list: Vec<&usize> = vec![];
        assert_eq!(graph.successors(6).unwrap(), empty_vertex_list);

        // vertex 7 does not exist
        assert!(graph.successors(7).is_err());
    }

    #[test]
    fn test_predecessors() {
        let graph = create_test_graph();

        let empty_vertex_list: Vec<&usize> = vec![];
        assert_eq!(graph.predecessors(1).unwrap(), empty_vertex_list);

        assert_eq!(graph.predecessors(2).unwrap(), vec![&1, &5]);

        // vertex 7 does not exist
        assert!(graph.successors(7).is_err());
    }

    #[test]
    fn test_duplicate_vertex() {
        let mut graph = create_test_graph();

        assert!(graph.insert_vertex(1).is_err());
        assert_eq!(graph.num_vertices(), 6);
    }

    #[test]
    fn test_duplicate_edge() {
        let mut graph = create_test_graph();

        assert!(graph.insert_edge(NullEdge::new(1, 2)).is_err());
        assert_eq!(graph.num_edges(), 7);
    }

    #[test]
    fn test_edge_into_missing_vertex() {
        let mut graph = create_test_graph();

        assert_eq!(
            graph.insert_edge(NullEdge::new(1, 7)),
            Err(Error::GraphVertexNotFound(7))
        );
    }

    #[test]
    fn test_edges_in_out() {
        let graph = create_test_graph();

        assert_eq!(graph.edges_out(2).unwrap().len(), 3);
        assert_eq!(graph.edges_in(5).unwrap().len(), 2);
        assert!(graph.edges_out(7).is_err());

        assert_eq!(graph.edge(1, 2).unwrap(), &NullEdge::new(1, 2));
        assert!(graph.edge(2, 1).is_err());
    }

    #[test]
    fn test_dot_graph() {
        let graph = create_test_graph();

        let dot = graph.dot_graph();
        assert!(dot.starts_with("digraph G {"));
        assert!(dot.contains("1 -> 2"));
    }
}
