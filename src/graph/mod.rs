//! Job dependency graph: the model, how it is populated from Jenkins, and
//! how it is serialized for Graphviz.

mod builder;
mod dot;
mod label;

pub use builder::{build_graph, TraversalOptions};
pub use label::Label;

use indexmap::{IndexMap, IndexSet};

/// Shape used for job nodes; the HTML label draws its own table border.
pub const NODE_SHAPE: &str = "plaintext";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub label: Label,
    pub shape: &'static str,
}

/// A directed graph of jobs keyed by job name.
///
/// Nodes and edges keep insertion order so that serializing the same graph
/// always yields the same text. Adding a node twice replaces it, adding an
/// edge twice is a no-op.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    name: String,
    comment: String,
    nodes: IndexMap<String, Node>,
    edges: IndexSet<(String, String)>,
}

impl Graph {
    pub fn new(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_node(&mut self, id: &str, label: Label) {
        self.nodes.insert(
            id.to_string(),
            Node {
                label,
                shape: NODE_SHAPE,
            },
        );
    }

    /// Adds an edge meaning "`upstream` triggers `downstream`".
    pub fn add_edge(&mut self, upstream: &str, downstream: &str) {
        self.edges.insert((upstream.to_string(), downstream.to_string()));
    }

    #[cfg(test)]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
