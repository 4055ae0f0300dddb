//! Loaders that populate a graph through [`GraphSink`].
//!
//! `nodes.jsonl` / `edges.jsonl` directories are always supported; GraphML documents
//! need the `graphml` feature.

mod jsonl;

#[cfg(feature = "graphml")]
mod graphml;

pub use diablo_types::GraphSink;
#[cfg(feature = "graphml")]
pub use graphml::{parse_graphml, read_graphml, read_graphml_with_config};
pub use jsonl::{load, load_into, load_with_config, read_edges, read_nodes, EDGES_FILE, NODES_FILE};

use diablo_types::GraphError;

/// Counts reported by a completed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub nodes: usize,
    pub edges: usize,
    /// GraphML nodes dropped because a datum key was not declared.
    pub skipped_nodes: usize,
}

// ============================================================================
// Errors
// ============================================================================

/// Loader failures. Nothing is retried; a failed load should be discarded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {origin}: {source}")]
    FileAccess {
        origin: String,
        source: std::io::Error,
    },

    #[error("{origin}:{line}: malformed record: {source}")]
    Json {
        origin: String,
        line: usize,
        source: serde_json::Error,
    },

    #[error("{origin}: malformed GraphML: {message}")]
    Markup { origin: String, message: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}
