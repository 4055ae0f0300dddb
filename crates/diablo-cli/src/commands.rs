use anyhow::{bail, Context};
use diablo_graph::Graph;
use diablo_types::GraphConfig;
use serde_json::json;
use std::io::Write;
use std::path::Path;

/// Load `source`: a directory holds the JSONL pair, a `.graphml` file is parsed as GraphML.
pub fn open(source: &Path, config: &GraphConfig) -> anyhow::Result<Graph> {
    tracing::info!(source = %source.display(), order = config.order, "opening graph");
    let graph = if source.is_dir() {
        diablo_load::load_with_config(source, config)?
    } else if source
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("graphml"))
    {
        diablo_load::read_graphml_with_config(source, config)?
    } else {
        bail!("{} is neither a directory nor a .graphml file", source.display());
    };
    Ok(graph)
}

pub fn stats(graph: &Graph, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "nodes: {}", graph.node_count())?;
    writeln!(out, "edges: {}", graph.edge_count())?;
    Ok(())
}

/// One `target<TAB>label` line per outgoing edge; unlabelled edges print `-`.
pub fn neighbors(
    graph: &Graph,
    id: &str,
    relationship: Option<&str>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for n in graph.neighbors(id, relationship) {
        writeln!(
            out,
            "{}\t{}",
            n.target,
            n.relationship.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

pub struct WalkRequest {
    pub ids: Vec<String>,
    pub relationship: Option<String>,
    pub hops: usize,
    pub json: bool,
}

pub fn walk(graph: &Graph, request: &WalkRequest, out: &mut impl Write) -> anyhow::Result<()> {
    let mut cursor = diablo_graph::walk(graph, request.ids.iter().cloned());
    for _ in 0..request.hops {
        cursor = cursor.expand(request.relationship.as_deref());
    }

    if request.json {
        let nodes = cursor
            .materialize()
            .context("walk reached a node that is not in the graph")?;
        for (id, attributes) in nodes {
            writeln!(out, "{}", json!({ "id": id, "attributes": attributes }))?;
        }
    } else {
        for id in cursor.ids()? {
            writeln!(out, "{id}")?;
        }
    }
    Ok(())
}
