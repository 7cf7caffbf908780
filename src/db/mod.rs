//! # Query Execution Boundary
//!
//! [`GraphDatabase`] is the contract between the entity layer and any
//! query executor. Entities emit one statement per operation and
//! consume the rows that come back; everything about transport,
//! transactions and retries lives behind this trait.

pub mod memory;

pub use memory::LocalGraph;

use async_trait::async_trait;

use crate::entity::{StructuredNode, StructuredRel};
use crate::model::{PropertyMap, Value};
use crate::schema::ClassRegistry;
use crate::{Error, Result};

// ============================================================================
// Results
// ============================================================================

/// Raw result of one statement: ordered rows of wire values plus the
/// column names, in query order.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// A wire value mapped back through the class registry.
#[derive(Debug)]
pub enum Resolved {
    Node(StructuredNode),
    Relationship(StructuredRel),
    Scalar(Value),
}

impl Resolved {
    pub fn into_node(self) -> Result<StructuredNode> {
        match self {
            Resolved::Node(node) => Ok(node),
            other => Err(Error::TypeError {
                expected: "a resolved node".to_string(),
                got: format!("{other:?}"),
            }),
        }
    }

    pub fn into_relationship(self) -> Result<StructuredRel> {
        match self {
            Resolved::Relationship(rel) => Ok(rel),
            other => Err(Error::TypeError {
                expected: "a resolved relationship".to_string(),
                got: format!("{other:?}"),
            }),
        }
    }
}

// ============================================================================
// GraphDatabase
// ============================================================================

/// The query-execution collaborator.
///
/// The entity layer issues at most one outstanding statement per call
/// and awaits its single result; failures propagate unchanged.
#[async_trait]
pub trait GraphDatabase: Send + Sync {
    /// Execute one statement and return its raw rows.
    async fn cypher_query(&self, statement: &str, params: PropertyMap) -> Result<QueryResult>;

    /// Execute one statement and map every returned graph entity back
    /// to its registered class.
    async fn cypher_query_resolved(
        &self,
        statement: &str,
        params: PropertyMap,
    ) -> Result<Vec<Vec<Resolved>>>;

    /// The identifier-equality function to interpolate into statements
    /// (`id` on 4.x-style backends, `elementId` on 5.x).
    fn id_method(&self) -> &str;

    /// Turn a stored element identifier into a parameter-ready value.
    fn parse_element_id(&self, element_id: &str) -> Result<Value>;
}

/// Map one wire value through the registry: raw nodes inflate as their
/// registered class, raw relationships fall back to a bare relationship
/// class when their type is unregistered.
pub(crate) fn resolve_value(registry: &ClassRegistry, value: Value) -> Result<Resolved> {
    match value {
        Value::Node(raw) => {
            let class = registry.node_class(&raw)?;
            Ok(Resolved::Node(StructuredNode::inflate(&class, &raw)?))
        }
        Value::Relationship(raw) => {
            let class = match registry.rel_class(&raw) {
                Some(class) => class,
                None => crate::schema::EntityClass::rel(raw.rel_type.clone()).build()?,
            };
            Ok(Resolved::Relationship(StructuredRel::inflate(&class, &raw)?))
        }
        scalar => Ok(Resolved::Scalar(scalar)),
    }
}
