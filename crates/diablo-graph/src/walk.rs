//! Lazy, chainable traversals over a [`Graph`].
//!
//! A [`Walk`] records a starting frontier and a list of steps. Chaining a step returns a
//! new `Walk` and leaves the original untouched, so one walk can branch into several
//! independent chains. No node or adjacency data is read until a terminal
//! (`ids`, `count`, `materialize`, `values`, `edges`, `is_empty`) runs, and every terminal
//! re-runs the whole chain from the seed.

use crate::Graph;
use diablo_types::{Attributes, GraphError, Neighbor};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Attribute predicate used by [`Walk::filter`].
pub type Predicate<'g> = Arc<dyn Fn(&Attributes) -> bool + Send + Sync + 'g>;

/// Ordered set of active node ids.
type Frontier = BTreeSet<String>;

#[derive(Clone)]
enum Step<'g> {
    /// Replace the frontier.
    Select(Arc<Frontier>),
    /// Keep ids whose attributes satisfy the predicate.
    Filter(Predicate<'g>),
    /// Replace the frontier with the union of outgoing neighbors.
    Expand(Option<String>),
}

impl fmt::Debug for Step<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Select(ids) => f.debug_tuple("Select").field(ids).finish(),
            Step::Filter(_) => f.write_str("Filter(..)"),
            Step::Expand(rel) => f.debug_tuple("Expand").field(rel).finish(),
        }
    }
}

/// Immutable traversal cursor: a shared graph reference, a seed frontier and deferred steps.
#[derive(Clone)]
pub struct Walk<'g> {
    graph: &'g Graph,
    seed: Arc<Frontier>,
    steps: Vec<Step<'g>>,
}

impl<'g> Walk<'g> {
    /// Walk with an empty frontier.
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            seed: Arc::new(Frontier::new()),
            steps: Vec::new(),
        }
    }

    fn seeded(graph: &'g Graph, seed: Frontier) -> Self {
        Self {
            graph,
            seed: Arc::new(seed),
            steps: Vec::new(),
        }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    fn then(&self, step: Step<'g>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self {
            graph: self.graph,
            seed: Arc::clone(&self.seed),
            steps,
        }
    }

    /// Replace the frontier with `ids`. Unknown ids are accepted here; attribute-reading
    /// steps and terminals report them as [`GraphError::NodeNotFound`].
    pub fn select<I, S>(&self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Frontier = ids.into_iter().map(Into::into).collect();
        self.then(Step::Select(Arc::new(ids)))
    }

    /// Keep only nodes whose attributes satisfy `predicate`.
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Attributes) -> bool + Send + Sync + 'g,
    {
        self.then(Step::Filter(Arc::new(predicate)))
    }

    /// Keep only nodes whose attribute `key` equals `value`.
    pub fn has(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let key = key.into();
        let value = value.into();
        self.filter(move |attrs| attrs.get(&key) == Some(&value))
    }

    /// Move the frontier to the outgoing neighbors of every active node, optionally only
    /// along edges labelled `relationship`. Shared neighbors appear once.
    pub fn expand(&self, relationship: Option<&str>) -> Self {
        self.then(Step::Expand(relationship.map(str::to_string)))
    }

    fn evaluate(&self) -> Result<Frontier, GraphError> {
        let mut active: Frontier = (*self.seed).clone();
        for step in &self.steps {
            active = match step {
                Step::Select(ids) => (**ids).clone(),
                Step::Filter(predicate) => {
                    let mut kept = Frontier::new();
                    for id in active {
                        if predicate(self.graph.get_node(&id)?) {
                            kept.insert(id);
                        }
                    }
                    kept
                }
                Step::Expand(relationship) => active
                    .iter()
                    .flat_map(|id| self.graph.neighbors(id, relationship.as_deref()))
                    .map(|n| n.target.clone())
                    .collect(),
            };
        }
        tracing::debug!(
            steps = self.steps.len(),
            active = active.len(),
            "walk evaluated"
        );
        Ok(active)
    }

    /// Active ids in ascending order.
    pub fn ids(&self) -> Result<Vec<String>, GraphError> {
        Ok(self.evaluate()?.into_iter().collect())
    }

    pub fn count(&self) -> Result<usize, GraphError> {
        Ok(self.evaluate()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, GraphError> {
        Ok(self.evaluate()?.is_empty())
    }

    /// Active nodes with their attributes, in ascending id order.
    pub fn materialize(&self) -> Result<Vec<(String, &'g Attributes)>, GraphError> {
        let graph = self.graph;
        self.evaluate()?
            .into_iter()
            .map(|id| {
                let attrs = graph.get_node(&id)?;
                Ok((id, attrs))
            })
            .collect()
    }

    /// The value of attribute `key` on each active node that carries it.
    pub fn values(&self, key: &str) -> Result<Vec<&'g serde_json::Value>, GraphError> {
        let graph = self.graph;
        let mut out = Vec::new();
        for id in self.evaluate()? {
            if let Some(value) = graph.get_node(&id)?.get(key) {
                out.push(value);
            }
        }
        Ok(out)
    }

    /// Outgoing edges of the active nodes as `(source, entry)`, optionally filtered by label.
    pub fn edges(
        &self,
        relationship: Option<&str>,
    ) -> Result<Vec<(String, &'g Neighbor)>, GraphError> {
        let graph = self.graph;
        let mut out = Vec::new();
        for id in self.evaluate()? {
            for neighbor in graph.neighbors(&id, relationship) {
                out.push((id.clone(), neighbor));
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for Walk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walk")
            .field("seed", &self.seed)
            .field("steps", &self.steps)
            .finish()
    }
}

/// Begin a traversal at `ids`. An empty iterator gives an empty frontier.
pub fn walk<'g, I, S>(graph: &'g Graph, ids: I) -> Walk<'g>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Walk::seeded(graph, ids.into_iter().map(Into::into).collect())
}

/// Begin a traversal at a single node id.
pub fn walk_one(graph: &Graph, id: impl Into<String>) -> Walk<'_> {
    Walk::seeded(graph, Frontier::from([id.into()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn person(age: i64, city: &str) -> Attributes {
        Attributes::from([
            ("age".to_string(), json!(age)),
            ("city".to_string(), json!(city)),
        ])
    }

    /// a -knows-> b, a -knows-> c, b -knows-> d, c -knows-> d, c -works_with-> e
    fn sample() -> Graph {
        let mut g = Graph::new();
        g.add_node("a", person(30, "Oslo"));
        g.add_node("b", person(25, "Paris"));
        g.add_node("c", person(41, "Oslo"));
        g.add_node("d", person(19, "Rome"));
        g.add_node("e", person(52, "Paris"));
        for (s, t) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")] {
            g.add_edge(s, t, Some("knows".to_string()));
        }
        g.add_edge("c", "e", Some("works_with".to_string()));
        g
    }

    #[test]
    fn empty_walk_has_no_ids() {
        let g = sample();
        let w = Walk::new(&g);
        assert!(w.is_empty().unwrap());
        assert_eq!(w.count().unwrap(), 0);
        assert_eq!(walk(&g, Vec::<String>::new()).count().unwrap(), 0);
    }

    #[test]
    fn single_and_multi_entry_points() {
        let g = sample();
        assert_eq!(walk_one(&g, "a").ids().unwrap(), vec!["a"]);
        assert_eq!(walk(&g, ["c", "a", "c"]).ids().unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn expand_collapses_shared_neighbors() {
        let g = sample();
        let ids = walk(&g, ["b", "c"]).expand(Some("knows")).ids().unwrap();
        assert_eq!(ids, vec!["d"]);
    }

    #[test]
    fn expand_without_label_follows_every_edge() {
        let g = sample();
        let ids = walk_one(&g, "c").expand(None).ids().unwrap();
        assert_eq!(ids, vec!["d", "e"]);
        let two_hops = walk_one(&g, "a").expand(None).expand(None).ids().unwrap();
        assert_eq!(two_hops, vec!["d", "e"]);
    }

    #[test]
    fn filter_and_has_narrow_the_frontier() {
        let g = sample();
        let older = walk_one(&g, "a")
            .expand(Some("knows"))
            .filter(|a| a.get("age").and_then(|v| v.as_i64()).unwrap_or(0) > 30);
        assert_eq!(older.ids().unwrap(), vec!["c"]);
        let in_paris = walk(&g, ["a", "b", "c", "d", "e"]).has("city", "Paris");
        assert_eq!(in_paris.ids().unwrap(), vec!["b", "e"]);
    }

    #[test]
    fn select_replaces_the_frontier() {
        let g = sample();
        let w = walk_one(&g, "a").expand(None).select(["e"]);
        assert_eq!(w.ids().unwrap(), vec!["e"]);
    }

    #[test]
    fn chain_construction_is_lazy() {
        let g = sample();
        let calls = AtomicUsize::new(0);
        let w = walk(&g, ["a", "b", "c"]).filter(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            true
        });
        let chained = w.expand(None).filter(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            true
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // {a, b, c} -> filter (3 calls) -> expand -> {b, c, d, e} -> filter (4 calls)
        assert_eq!(chained.count().unwrap(), 4);
        let after_first = calls.load(Ordering::SeqCst);
        assert_eq!(after_first, 3 + 4);
        assert_eq!(chained.ids().unwrap(), vec!["b", "c", "d", "e"]);
        assert_eq!(calls.load(Ordering::SeqCst), after_first * 2);
    }

    #[test]
    fn missing_node_fails_only_when_attributes_are_read() {
        let g = sample();
        let w = walk(&g, ["a", "ghost"]);
        assert_eq!(w.count().unwrap(), 2);
        let filtered = w.filter(|_| true);
        assert_eq!(
            filtered.ids().unwrap_err(),
            GraphError::NodeNotFound("ghost".to_string())
        );
        assert_eq!(
            w.materialize().unwrap_err(),
            GraphError::NodeNotFound("ghost".to_string())
        );
    }

    #[test]
    fn branching_leaves_the_parent_untouched() {
        let g = sample();
        let root = walk_one(&g, "a");
        let knows = root.expand(Some("knows"));
        let none = root.expand(Some("works_with"));
        assert_eq!(root.ids().unwrap(), vec!["a"]);
        assert_eq!(knows.ids().unwrap(), vec!["b", "c"]);
        assert!(none.is_empty().unwrap());
    }

    #[test]
    fn materialize_values_and_edges() {
        let g = sample();
        let w = walk_one(&g, "a").expand(None);
        let nodes = w.materialize().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].0, "b");
        assert_eq!(nodes[0].1.get("city"), Some(&json!("Paris")));

        let ages: Vec<&serde_json::Value> = w.values("age").unwrap();
        assert_eq!(ages, vec![&json!(25), &json!(41)]);
        assert!(w.values("missing").unwrap().is_empty());

        let edges = w.edges(None).unwrap();
        let pairs: Vec<(&str, &str)> = edges
            .iter()
            .map(|(s, n)| (s.as_str(), n.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("b", "d"), ("c", "d"), ("c", "e")]);
        assert_eq!(w.edges(Some("works_with")).unwrap().len(), 1);
    }

    #[test]
    fn edges_borrow_the_graph_not_the_label() {
        let g = sample();
        let w = walk_one(&g, "c");
        let label = String::from("works_with");
        let edges = w.edges(Some(&label)).unwrap();
        drop(label);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].0, "c");
        assert_eq!(edges[0].1.target, "e");
    }

    #[test]
    fn walks_share_a_graph_across_threads() {
        let g = sample();
        let base = walk_one(&g, "a");
        std::thread::scope(|scope| {
            let a = scope.spawn(|| base.expand(Some("knows")).count());
            let b = scope.spawn(|| base.expand(None).expand(None).count());
            assert_eq!(a.join().unwrap().unwrap(), 2);
            assert_eq!(b.join().unwrap().unwrap(), 2);
        });
    }
}
