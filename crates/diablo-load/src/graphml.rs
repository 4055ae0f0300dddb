//! GraphML reader.
//!
//! Only one `<graph>` element is read. `<key>` declarations map datum keys to
//! attribute names. A node whose data references an undeclared key is skipped;
//! an edge doing the same fails the whole document.

use crate::{LoadError, LoadSummary};
use diablo_graph::Graph;
use diablo_types::{Attributes, GraphConfig, GraphSink};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Edge datum whose text becomes the edge's relationship label.
const RELATIONSHIP_ATTR: &str = "relationship";

pub fn read_graphml(path: impl AsRef<Path>) -> Result<Graph, LoadError> {
    read_graphml_with_config(path, &GraphConfig::default())
}

pub fn read_graphml_with_config(
    path: impl AsRef<Path>,
    config: &GraphConfig,
) -> Result<Graph, LoadError> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::FileAccess {
        origin: origin.clone(),
        source,
    })?;
    let mut graph = Graph::with_config(config)?;
    let summary = parse_graphml(&text, &origin, &mut graph)?;
    tracing::info!(
        path = %origin,
        nodes = summary.nodes,
        edges = summary.edges,
        skipped = summary.skipped_nodes,
        "loaded GraphML"
    );
    Ok(graph)
}

/// Parse a whole document and feed it into `sink`. Nothing reaches `sink` unless the
/// document is well formed and every edge datum resolves.
pub fn parse_graphml<S>(xml: &str, origin: &str, sink: &mut S) -> Result<LoadSummary, LoadError>
where
    S: GraphSink + ?Sized,
{
    let markup = |message: String| LoadError::Markup {
        origin: origin.to_string(),
        message,
    };
    let doc = Document::parse(xml).map_err(markup)?;
    let (nodes, skipped_nodes) = doc.resolve_nodes();
    let edges = doc.resolve_edges().map_err(markup)?;

    let summary = LoadSummary {
        nodes: nodes.len(),
        edges: edges.len(),
        skipped_nodes,
    };
    for (id, attributes) in nodes {
        sink.add_node(id, attributes);
    }
    for (source, target, relationship) in edges {
        sink.add_edge(source, target, relationship);
    }
    Ok(summary)
}

struct Datum {
    key: String,
    text: String,
}

struct NodeElement {
    id: String,
    data: Vec<Datum>,
}

struct EdgeElement {
    source: String,
    target: String,
    data: Vec<Datum>,
}

type ResolvedEdge = (String, String, Option<String>);

#[derive(Default)]
struct Document {
    /// key id -> attribute name.
    keys: HashMap<String, String>,
    nodes: Vec<NodeElement>,
    edges: Vec<EdgeElement>,
}

impl Document {
    fn parse(xml: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut parser = Parser::default();
        loop {
            let event = reader
                .read_event()
                .map_err(|err| format!("{err} (near byte {})", reader.buffer_position()))?;
            match event {
                Event::Start(e) => parser.start(&e, false)?,
                Event::Empty(e) => parser.start(&e, true)?,
                Event::End(e) => parser.end(e.local_name().as_ref()),
                Event::Text(t) => {
                    let text = t.unescape().map_err(|err| err.to_string())?;
                    parser.text(&text);
                }
                Event::CData(c) => parser.text(&String::from_utf8_lossy(&c)),
                Event::Eof => break,
                _ => {}
            }
        }
        parser.finish()
    }

    fn resolve_nodes(&self) -> (Vec<(String, Attributes)>, usize) {
        let mut resolved = Vec::with_capacity(self.nodes.len());
        let mut skipped = 0;
        'nodes: for node in &self.nodes {
            let mut attributes = Attributes::new();
            for datum in &node.data {
                let Some(name) = self.keys.get(&datum.key) else {
                    tracing::debug!(node = %node.id, key = %datum.key, "skipping node with undeclared data key");
                    skipped += 1;
                    continue 'nodes;
                };
                attributes.insert(name.clone(), Value::String(datum.text.clone()));
            }
            resolved.push((node.id.clone(), attributes));
        }
        (resolved, skipped)
    }

    fn resolve_edges(&self) -> Result<Vec<ResolvedEdge>, String> {
        self.edges
            .iter()
            .map(|edge| {
                let mut relationship = None;
                for datum in &edge.data {
                    let name = self.keys.get(&datum.key).ok_or_else(|| {
                        format!(
                            "edge {} -> {} references undeclared key `{}`",
                            edge.source, edge.target, datum.key
                        )
                    })?;
                    if name == RELATIONSHIP_ATTR {
                        relationship = Some(datum.text.clone());
                    }
                }
                Ok((edge.source.clone(), edge.target.clone(), relationship))
            })
            .collect()
    }
}

#[derive(Default)]
struct Parser {
    doc: Document,
    saw_root: bool,
    graphs: usize,
    in_graph: bool,
    node: Option<NodeElement>,
    edge: Option<EdgeElement>,
    datum: Option<Datum>,
    /// Open elements below the current `<data>`; their text is not part of the datum.
    nested: usize,
}

impl Parser {
    fn start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), String> {
        if self.datum.is_some() {
            if !empty {
                self.nested += 1;
            }
            return Ok(());
        }
        match e.local_name().as_ref() {
            b"graphml" => self.saw_root = true,
            b"key" => {
                let id = required(e, "id")?;
                let name = required(e, "attr.name")?;
                self.doc.keys.insert(id, name);
            }
            b"graph" => {
                self.graphs += 1;
                if self.graphs > 1 {
                    return Err("more than one <graph> element".to_string());
                }
                self.in_graph = !empty;
            }
            b"node" if self.in_graph && self.node.is_none() && self.edge.is_none() => {
                let node = NodeElement {
                    id: required(e, "id")?,
                    data: Vec::new(),
                };
                if empty {
                    self.doc.nodes.push(node);
                } else {
                    self.node = Some(node);
                }
            }
            b"edge" if self.in_graph && self.node.is_none() && self.edge.is_none() => {
                let edge = EdgeElement {
                    source: required(e, "source")?,
                    target: required(e, "target")?,
                    data: Vec::new(),
                };
                if empty {
                    self.doc.edges.push(edge);
                } else {
                    self.edge = Some(edge);
                }
            }
            b"data" if self.node.is_some() || self.edge.is_some() => {
                let datum = Datum {
                    key: required(e, "key")?,
                    text: String::new(),
                };
                if empty {
                    self.push_datum(datum);
                } else {
                    self.datum = Some(datum);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        if self.nested > 0 {
            self.nested -= 1;
            return;
        }
        match name {
            b"data" => {
                if let Some(datum) = self.datum.take() {
                    self.push_datum(datum);
                }
            }
            b"node" => {
                if let Some(node) = self.node.take() {
                    self.doc.nodes.push(node);
                }
            }
            b"edge" => {
                if let Some(edge) = self.edge.take() {
                    self.doc.edges.push(edge);
                }
            }
            b"graph" => self.in_graph = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.nested > 0 {
            return;
        }
        if let Some(datum) = self.datum.as_mut() {
            datum.text.push_str(text);
        }
    }

    fn push_datum(&mut self, datum: Datum) {
        if let Some(node) = self.node.as_mut() {
            node.data.push(datum);
        } else if let Some(edge) = self.edge.as_mut() {
            edge.data.push(datum);
        }
    }

    fn finish(self) -> Result<Document, String> {
        if !self.saw_root {
            return Err("missing <graphml> root element".to_string());
        }
        if self.graphs == 0 {
            return Err("missing <graph> element".to_string());
        }
        Ok(self.doc)
    }
}

fn required(e: &BytesStart<'_>, name: &str) -> Result<String, String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        if attr.key.as_ref() == name.as_bytes() {
            return attr
                .unescape_value()
                .map(|value| value.into_owned())
                .map_err(|err| err.to_string());
        }
    }
    Err(format!(
        "<{}> is missing the `{name}` attribute",
        String::from_utf8_lossy(e.local_name().as_ref())
    ))
}
