//! In-memory graph store: a B-tree node index plus outgoing adjacency lists.

use crate::btree::BTree;
use diablo_types::{Attributes, GraphConfig, GraphError, GraphSink, Neighbor};
use std::collections::HashMap;

/// source id -> outgoing (target, relationship) entries, in insertion order.
type EdgeIndex = HashMap<String, Vec<Neighbor>>;

/// Directed, labelled multigraph keyed by string node ids.
///
/// Edges may reference ids that are not (yet) indexed nodes; this lets node and edge
/// files load independently and in either order.
#[derive(Debug, Clone)]
pub struct Graph {
    /// node_id -> attributes.
    nodes: BTree<String, Attributes>,
    /// source_id -> outgoing edges.
    out_index: EdgeIndex,
    edge_count: usize,
}

impl Graph {
    /// Empty graph with the default index order.
    pub fn new() -> Self {
        Self::from_index(BTree::default())
    }

    pub fn with_order(order: usize) -> Result<Self, GraphError> {
        Ok(Self::from_index(BTree::new(order)?))
    }

    pub fn with_config(config: &GraphConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Self::with_order(config.order)
    }

    fn from_index(nodes: BTree<String, Attributes>) -> Self {
        Self {
            nodes,
            out_index: HashMap::new(),
            edge_count: 0,
        }
    }

    /// Branching order of the node index.
    pub fn order(&self) -> usize {
        self.nodes.order()
    }

    /// Insert a node, replacing the attributes of any node with the same id.
    pub fn add_node(&mut self, id: impl Into<String>, attributes: Attributes) {
        self.nodes.insert(id.into(), attributes);
    }

    /// Append `source -> target`. Neither endpoint has to exist; duplicates are kept.
    pub fn add_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        relationship: Option<String>,
    ) {
        self.out_index
            .entry(source.into())
            .or_default()
            .push(Neighbor::new(target, relationship));
        self.edge_count += 1;
    }

    pub fn get_node(&self, id: &str) -> Result<&Attributes, GraphError> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Outgoing edges of `id`, optionally restricted to one relationship label.
    /// Unknown ids have no neighbors.
    pub fn neighbors<'a, 'r>(
        &'a self,
        id: &str,
        relationship: Option<&'r str>,
    ) -> impl Iterator<Item = &'a Neighbor> + 'r
    where
        'a: 'r,
    {
        self.out_index
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(move |n| n.matches(relationship))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// All nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &Attributes)> + '_ {
        self.nodes.iter().map(|(id, attrs)| (id.as_str(), attrs))
    }

    /// Every stored edge as `(source, entry)`. Sources come in no particular order;
    /// edges of one source keep insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &Neighbor)> + '_ {
        self.out_index
            .iter()
            .flat_map(|(source, list)| list.iter().map(move |n| (source.as_str(), n)))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphSink for Graph {
    fn add_node(&mut self, id: String, attributes: Attributes) {
        Graph::add_node(self, id, attributes);
    }

    fn add_edge(&mut self, source: String, target: String, relationship: Option<String>) {
        Graph::add_edge(self, source, target, relationship);
    }
}
