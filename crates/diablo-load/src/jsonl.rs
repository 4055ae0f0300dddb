//! Bulk loader for a directory holding `nodes.jsonl` and `edges.jsonl`.

use crate::{LoadError, LoadSummary};
use diablo_graph::Graph;
use diablo_types::{EdgeRecord, GraphConfig, GraphSink, NodeRecord};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const NODES_FILE: &str = "nodes.jsonl";
pub const EDGES_FILE: &str = "edges.jsonl";

/// Build a graph with the default index order from `dir/nodes.jsonl` and `dir/edges.jsonl`.
pub fn load(dir: impl AsRef<Path>) -> Result<Graph, LoadError> {
    load_with_config(dir, &GraphConfig::default())
}

pub fn load_with_config(dir: impl AsRef<Path>, config: &GraphConfig) -> Result<Graph, LoadError> {
    let mut graph = Graph::with_config(config)?;
    let summary = load_into(dir.as_ref(), &mut graph)?;
    tracing::info!(
        dir = %dir.as_ref().display(),
        nodes = summary.nodes,
        edges = summary.edges,
        "loaded graph"
    );
    Ok(graph)
}

/// Feed both files of `dir` into `sink`, nodes first. On error `sink` may hold a prefix
/// of the records.
pub fn load_into<S>(dir: impl AsRef<Path>, sink: &mut S) -> Result<LoadSummary, LoadError>
where
    S: GraphSink + ?Sized,
{
    let dir = dir.as_ref();
    let nodes_path = dir.join(NODES_FILE);
    let edges_path = dir.join(EDGES_FILE);
    let nodes = read_nodes(open(&nodes_path)?, &nodes_path.display().to_string(), sink)?;
    let edges = read_edges(open(&edges_path)?, &edges_path.display().to_string(), sink)?;
    Ok(LoadSummary {
        nodes,
        edges,
        skipped_nodes: 0,
    })
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::FileAccess {
            origin: path.display().to_string(),
            source,
        })
}

/// Read `{"nid": .., "attributes": {..}}` lines into `sink`; returns the record count.
/// `origin` names the input in error messages.
pub fn read_nodes<R, S>(reader: R, origin: &str, sink: &mut S) -> Result<usize, LoadError>
where
    R: BufRead,
    S: GraphSink + ?Sized,
{
    read_records(reader, origin, |record: NodeRecord| {
        sink.add_node(record.nid, record.attributes)
    })
}

/// Read `{"source": .., "target": .., "relationship": ..}` lines into `sink`.
pub fn read_edges<R, S>(reader: R, origin: &str, sink: &mut S) -> Result<usize, LoadError>
where
    R: BufRead,
    S: GraphSink + ?Sized,
{
    read_records(reader, origin, |record: EdgeRecord| {
        sink.add_edge(record.source, record.target, record.relationship)
    })
}

fn read_records<R, T, F>(reader: R, origin: &str, mut each: F) -> Result<usize, LoadError>
where
    R: BufRead,
    T: DeserializeOwned,
    F: FnMut(T),
{
    let mut count = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::FileAccess {
            origin: origin.to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| LoadError::Json {
            origin: origin.to_string(),
            line: idx + 1,
            source,
        })?;
        each(record);
        count += 1;
    }
    Ok(count)
}
