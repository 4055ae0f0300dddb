//! Node and edge records shared by the store, the walk engine, and the loaders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute bundle stored against a node id.
pub type Attributes = HashMap<String, serde_json::Value>;

/// One outgoing adjacency entry: the edge target plus its optional relationship label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Neighbor {
    pub target: String,
    #[serde(default)]
    pub relationship: Option<String>,
}

impl Neighbor {
    pub fn new(target: impl Into<String>, relationship: Option<String>) -> Self {
        Self {
            target: target.into(),
            relationship,
        }
    }

    /// True when `relationship` is `None` (no filter) or equals this entry's label.
    pub fn matches(&self, relationship: Option<&str>) -> bool {
        match relationship {
            None => true,
            Some(rel) => self.relationship.as_deref() == Some(rel),
        }
    }
}

/// Node line of `nodes.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub nid: String,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Edge line of `edges.jsonl`. A missing or `null` relationship means "no label".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbor_matches_relationship_filter() {
        let labelled = Neighbor::new("b", Some("knows".to_string()));
        let bare = Neighbor::new("c", None);
        assert!(labelled.matches(None));
        assert!(labelled.matches(Some("knows")));
        assert!(!labelled.matches(Some("likes")));
        assert!(bare.matches(None));
        assert!(!bare.matches(Some("knows")));
    }

    #[test]
    fn edge_record_relationship_is_optional() {
        let with_null: EdgeRecord =
            serde_json::from_str(r#"{"source":"a","target":"b","relationship":null}"#).unwrap();
        assert_eq!(with_null.relationship, None);
        let missing: EdgeRecord = serde_json::from_str(r#"{"source":"a","target":"b"}"#).unwrap();
        assert_eq!(missing.relationship, None);
        let labelled: EdgeRecord =
            serde_json::from_str(r#"{"source":"a","target":"b","relationship":"knows"}"#).unwrap();
        assert_eq!(labelled.relationship.as_deref(), Some("knows"));
    }

    #[test]
    fn node_record_requires_nid() {
        let rec: NodeRecord =
            serde_json::from_str(r#"{"nid":"a","attributes":{"age":3}}"#).unwrap();
        assert_eq!(rec.nid, "a");
        assert_eq!(rec.attributes["age"], serde_json::json!(3));
        assert!(serde_json::from_str::<NodeRecord>(r#"{"attributes":{}}"#).is_err());
    }
}
