//! In-memory query executor.
//!
//! This is the reference implementation of [`GraphDatabase`]. It keeps
//! nodes and relationships in HashMaps behind RwLocks and interprets
//! only the canonical statement family the entity layer emits.
//!
//! ## Limitations
//!
//! - **No query language**: statements outside the recognized family
//!   fail with `Error::ExecutionError` rather than being parsed.
//! - **No transactions**: writes apply immediately.
//! - **4.x-style identifiers**: element ids are the integer id's string
//!   form and `id_method()` is `"id"`, so legacy integer views work.
//!
//! Use this executor for testing entity classes and for embedding the
//! OGM without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use regex::Regex;
use tracing::debug;

use async_trait::async_trait;

use crate::model::{Node, NodeId, PropertyMap, RelId, Relationship, Value};
use crate::schema::ClassRegistry;
use crate::{Error, Result};

use super::{resolve_value, GraphDatabase, QueryResult, Resolved};

static CREATE_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^CREATE \(n((?::\w+)*) \$props\) RETURN n$").expect("pattern compiles")
});
static MATCH_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^MATCH \((\w+)\) WHERE id\((\w+)\)=\$(\w+) RETURN (\w+)$").expect("pattern compiles")
});
static SET_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^MATCH \(n\) WHERE id\(n\)=\$self SET (.+) RETURN n$").expect("pattern compiles")
});
static DELETE_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^MATCH \(n\) WHERE id\(n\)=\$self DETACH DELETE n$").expect("pattern compiles")
});
static SET_REL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^MATCH \(\)-\[r\]->\(\) WHERE id\(r\)=\$self SET (.+)$").expect("pattern compiles")
});
static SET_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+\.(\w+) = \$(\w+)").expect("pattern compiles"));

// ============================================================================
// LocalGraph
// ============================================================================

/// In-memory property graph executor.
pub struct LocalGraph {
    registry: Arc<ClassRegistry>,
    nodes: RwLock<HashMap<u64, Node>>,
    rels: RwLock<HashMap<u64, Relationship>>,
    next_node_id: AtomicU64,
    next_rel_id: AtomicU64,
    executed: AtomicU64,
}

impl LocalGraph {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        LocalGraph {
            registry,
            nodes: RwLock::new(HashMap::new()),
            rels: RwLock::new(HashMap::new()),
            next_node_id: AtomicU64::new(1),
            next_rel_id: AtomicU64::new(1),
            executed: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// How many statements have been executed. Tests use this to assert
    /// round-trip counts.
    pub fn executed_statements(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Test fixture: place a node directly into storage.
    pub fn seed_node(&self, labels: &[&str], properties: PropertyMap) -> Node {
        let id = NodeId(self.next_node_id.fetch_add(1, Ordering::Relaxed));
        let node = Node {
            id,
            element_id: Some(id.to_string()),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties: drop_nulls(properties),
        };
        self.nodes.write().insert(id.0, node.clone());
        node
    }

    /// Test fixture: place a relationship directly into storage.
    pub fn seed_relationship(
        &self,
        rel_type: &str,
        src: NodeId,
        dst: NodeId,
        properties: PropertyMap,
    ) -> Relationship {
        let id = RelId(self.next_rel_id.fetch_add(1, Ordering::Relaxed));
        let rel = Relationship {
            id,
            element_id: Some(id.to_string()),
            src,
            dst,
            src_element_id: Some(src.to_string()),
            dst_element_id: Some(dst.to_string()),
            rel_type: rel_type.to_string(),
            properties: drop_nulls(properties),
        };
        self.rels.write().insert(id.0, rel.clone());
        rel
    }

    /// Read a stored relationship back, for assertions.
    pub fn relationship(&self, id: RelId) -> Option<Relationship> {
        self.rels.read().get(&id.0).cloned()
    }

    fn param_id(params: &PropertyMap, name: &str) -> Result<u64> {
        params
            .get(name)
            .and_then(Value::as_int)
            .map(|id| id as u64)
            .ok_or_else(|| {
                Error::ExecutionError(format!("missing or non-integer parameter ${name}"))
            })
    }

    fn execute(&self, statement: &str, params: PropertyMap) -> Result<QueryResult> {
        if let Some(caps) = CREATE_NODE.captures(statement) {
            let labels: Vec<&str> = caps[1].split(':').filter(|l| !l.is_empty()).collect();
            let props = match params.get("props") {
                Some(Value::Map(map)) => map.clone(),
                _ => {
                    return Err(Error::ExecutionError(
                        "CREATE expects a $props map parameter".to_string(),
                    ));
                }
            };
            let node = self.seed_node(&labels, props);
            return Ok(QueryResult {
                columns: vec!["n".to_string()],
                rows: vec![vec![Value::Node(Box::new(node))]],
            });
        }

        if let Some(caps) = MATCH_NODE.captures(statement) {
            let var = &caps[1];
            if &caps[2] != var || &caps[4] != var {
                return Err(Error::ExecutionError(format!(
                    "unsupported statement: {statement}"
                )));
            }
            let id = Self::param_id(&params, &caps[3])?;
            let rows = match self.nodes.read().get(&id) {
                Some(node) => vec![vec![Value::Node(Box::new(node.clone()))]],
                None => Vec::new(),
            };
            return Ok(QueryResult { columns: vec![var.to_string()], rows });
        }

        if let Some(caps) = SET_NODE.captures(statement) {
            let id = Self::param_id(&params, "self")?;
            let mut nodes = self.nodes.write();
            let rows = match nodes.get_mut(&id) {
                Some(node) => {
                    apply_set_pairs(&caps[1], &params, &mut node.properties)?;
                    vec![vec![Value::Node(Box::new(node.clone()))]]
                }
                None => Vec::new(),
            };
            return Ok(QueryResult { columns: vec!["n".to_string()], rows });
        }

        if DELETE_NODE.is_match(statement) {
            let id = Self::param_id(&params, "self")?;
            self.nodes.write().remove(&id);
            // DETACH: drop edges touching the node.
            self.rels
                .write()
                .retain(|_, rel| rel.src.0 != id && rel.dst.0 != id);
            return Ok(QueryResult::default());
        }

        if let Some(caps) = SET_REL.captures(statement) {
            let id = Self::param_id(&params, "self")?;
            let mut rels = self.rels.write();
            if let Some(rel) = rels.get_mut(&id) {
                apply_set_pairs(&caps[1], &params, &mut rel.properties)?;
            }
            return Ok(QueryResult::default());
        }

        Err(Error::ExecutionError(format!(
            "unsupported statement: {statement}"
        )))
    }
}

#[async_trait]
impl GraphDatabase for LocalGraph {
    async fn cypher_query(&self, statement: &str, params: PropertyMap) -> Result<QueryResult> {
        self.executed.fetch_add(1, Ordering::Relaxed);
        debug!(statement, "executing");
        self.execute(statement, params)
    }

    async fn cypher_query_resolved(
        &self,
        statement: &str,
        params: PropertyMap,
    ) -> Result<Vec<Vec<Resolved>>> {
        let result = self.cypher_query(statement, params).await?;
        result
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|value| resolve_value(&self.registry, value))
                    .collect()
            })
            .collect()
    }

    fn id_method(&self) -> &str {
        "id"
    }

    fn parse_element_id(&self, element_id: &str) -> Result<Value> {
        element_id
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| Error::ExecutionError(format!("invalid element id: {element_id:?}")))
    }
}

/// Apply `var.key = $param` pairs from a SET clause; null parameters
/// erase the key, matching how the database treats `SET x = null`.
fn apply_set_pairs(
    clause: &str,
    params: &PropertyMap,
    properties: &mut PropertyMap,
) -> Result<()> {
    for caps in SET_PAIR.captures_iter(clause) {
        let key = &caps[1];
        let param = &caps[2];
        let value = params.get(param).ok_or_else(|| {
            Error::ExecutionError(format!("missing parameter ${param}"))
        })?;
        if value.is_null() {
            properties.remove(key);
        } else {
            properties.insert(key.to_string(), value.clone());
        }
    }
    Ok(())
}

fn drop_nulls(mut properties: PropertyMap) -> PropertyMap {
    properties.retain(|_, value| !value.is_null());
    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::props;

    fn graph() -> LocalGraph {
        LocalGraph::new(Arc::new(ClassRegistry::new()))
    }

    #[tokio::test]
    async fn test_create_match_set_delete_cycle() {
        let graph = graph();

        let result = graph
            .cypher_query(
                "CREATE (n:Person $props) RETURN n",
                props([("props", Value::Map(HashMap::from([(
                    "name".to_string(),
                    Value::from("Ada"),
                )])))]),
            )
            .await
            .unwrap();
        let Value::Node(node) = &result.rows[0][0] else { panic!("expected node") };
        assert!(node.has_label("Person"));
        let id = Value::Int(node.id.0 as i64);

        let result = graph
            .cypher_query(
                "MATCH (n) WHERE id(n)=$self SET n.name = $name RETURN n",
                props([("self", id.clone()), ("name", Value::from("Grace"))]),
            )
            .await
            .unwrap();
        let Value::Node(node) = &result.rows[0][0] else { panic!("expected node") };
        assert_eq!(node.get("name"), Some(&Value::from("Grace")));

        graph
            .cypher_query(
                "MATCH (n) WHERE id(n)=$self DETACH DELETE n",
                props([("self", id.clone())]),
            )
            .await
            .unwrap();
        let result = graph
            .cypher_query(
                "MATCH (n) WHERE id(n)=$self RETURN n",
                props([("self", id)]),
            )
            .await
            .unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(graph.executed_statements(), 4);
    }

    #[tokio::test]
    async fn test_unsupported_statement_is_an_execution_error() {
        let err = graph()
            .cypher_query("MATCH (n) RETURN count(n)", PropertyMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExecutionError(_)));
    }

    #[tokio::test]
    async fn test_set_null_erases_the_key() {
        let graph = graph();
        let node = graph.seed_node(&["Person"], props([("nickname", Value::from("ada"))]));
        graph
            .cypher_query(
                "MATCH (n) WHERE id(n)=$self SET n.nickname = $nickname RETURN n",
                props([
                    ("self", Value::Int(node.id.0 as i64)),
                    ("nickname", Value::Null),
                ]),
            )
            .await
            .unwrap();
        let stored = graph.nodes.read().get(&node.id.0).cloned().unwrap();
        assert!(!stored.properties.contains_key("nickname"));
    }

    #[test]
    fn test_parse_element_id() {
        let graph = graph();
        assert_eq!(graph.parse_element_id("42").unwrap(), Value::Int(42));
        assert!(graph.parse_element_id("4:abc:42").is_err());
    }
}
