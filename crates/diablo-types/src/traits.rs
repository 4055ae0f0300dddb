//! Ingestion trait and graph errors.

use crate::Attributes;

/// The two-call interface loaders use to populate a graph.
///
/// Implementors must accept edges whose endpoints have not been added (yet).
pub trait GraphSink {
    /// Insert a node, replacing the attributes of an existing node with the same id.
    fn add_node(&mut self, id: String, attributes: Attributes);

    /// Append a directed edge `source -> target`.
    fn add_edge(&mut self, source: String, target: String, relationship: Option<String>);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("invalid index order {0}: must be at least 3")]
    InvalidOrder(usize),
}
