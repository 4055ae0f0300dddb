//! In-memory graph: a B-tree node index, adjacency-list edges, and lazy traversals.

mod btree;
mod store;
mod walk;

#[cfg(test)]
mod btree_proptests;

pub use btree::{BTree, Iter};
pub use diablo_types::{
    Attributes, EdgeRecord, GraphConfig, GraphError, GraphSink, Neighbor, NodeRecord,
    DEFAULT_ORDER,
};
pub use store::Graph;
pub use walk::{walk, walk_one, Predicate, Walk};
