//! Relationship (edge) in the property graph.

use serde::{Deserialize, Serialize};
use super::{NodeId, PropertyMap, Value};

/// Opaque relationship identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelId(pub u64);

impl std::fmt::Display for RelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

/// A relationship (directed edge) in the property graph, as returned by
/// a database. Endpoint element ids are carried alongside the numeric
/// ids so entity classes can resolve their start and end nodes later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelId,
    /// Neo4j 5.x stable element identifier (e.g. `"5:abc:456"`).
    pub element_id: Option<String>,
    pub src: NodeId,
    pub dst: NodeId,
    pub src_element_id: Option<String>,
    pub dst_element_id: Option<String>,
    pub rel_type: String,
    pub properties: PropertyMap,
}

impl Relationship {
    pub fn new(id: RelId, src: NodeId, dst: NodeId, rel_type: impl Into<String>) -> Self {
        Self {
            id,
            element_id: None,
            src,
            dst,
            src_element_id: None,
            dst_element_id: None,
            rel_type: rel_type.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_element_ids(
        mut self,
        element_id: impl Into<String>,
        src_element_id: impl Into<String>,
        dst_element_id: impl Into<String>,
    ) -> Self {
        self.element_id = Some(element_id.into());
        self.src_element_id = Some(src_element_id.into());
        self.dst_element_id = Some(dst_element_id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
