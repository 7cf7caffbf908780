//! Relationship entities.

use crate::db::GraphDatabase;
use crate::model::{PropertyMap, Relationship, Value};
use crate::schema::EntityClass;
use crate::{Error, Result};

use super::{legacy_id, render_set_clause, PropertyState};

/// A typed relationship instance bound to an [`EntityClass`].
///
/// Beyond its property state, an edge carries three independently
/// possibly-unset identity facets: its own element identifier and the
/// element identifiers of its two endpoints. All three are captured at
/// inflate time.
#[derive(Debug, Clone)]
pub struct StructuredRel {
    state: PropertyState,
    element_id: Option<String>,
    start_element_id: Option<String>,
    end_element_id: Option<String>,
}

impl StructuredRel {
    /// Construct an unsaved instance from a kwargs-style bag.
    pub fn new(class: &EntityClass, kwargs: PropertyMap) -> Result<Self> {
        Ok(StructuredRel {
            state: PropertyState::new(class, kwargs)?,
            element_id: None,
            start_element_id: None,
            end_element_id: None,
        })
    }

    /// Reconstruct an instance from a raw relationship row, capturing
    /// the identity facets from the edge and its endpoints.
    pub fn inflate(class: &EntityClass, raw: &Relationship) -> Result<Self> {
        let values = class.inflate_values(&raw.properties)?;
        let mut rel = StructuredRel::new(class, values)?;
        rel.element_id = raw.element_id.clone().or_else(|| Some(raw.id.to_string()));
        rel.start_element_id = raw
            .src_element_id
            .clone()
            .or_else(|| Some(raw.src.to_string()));
        rel.end_element_id = raw
            .dst_element_id
            .clone()
            .or_else(|| Some(raw.dst.to_string()));
        Ok(rel)
    }

    pub fn class(&self) -> &EntityClass {
        self.state.class()
    }

    pub fn state(&self) -> &PropertyState {
        &self.state
    }

    pub fn rel_type(&self) -> &str {
        self.class().rel_type()
    }

    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    pub fn start_node_element_id(&self) -> Option<&str> {
        self.start_element_id.as_deref()
    }

    pub fn end_node_element_id(&self) -> Option<&str> {
        self.end_element_id.as_deref()
    }

    /// Legacy integer identifier view of the edge.
    pub fn id(&self) -> Result<i64> {
        legacy_id(self.element_id())
    }

    /// Legacy integer identifier view of the start endpoint.
    pub fn start_node_id(&self) -> Result<i64> {
        legacy_id(self.start_node_element_id())
    }

    /// Legacy integer identifier view of the end endpoint.
    pub fn end_node_id(&self) -> Result<i64> {
        legacy_id(self.end_node_element_id())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.state.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.state.set(name, value);
    }

    pub fn properties(&self) -> PropertyMap {
        self.state.properties()
    }

    /// Resolve the start endpoint. Exactly one lookup keyed by its
    /// element identifier.
    pub async fn start_node(&self, db: &dyn GraphDatabase) -> Result<super::StructuredNode> {
        self.endpoint(db, self.start_node_element_id(), "start_node_element_id")
            .await
    }

    /// Resolve the end endpoint. Exactly one lookup keyed by its
    /// element identifier.
    pub async fn end_node(&self, db: &dyn GraphDatabase) -> Result<super::StructuredNode> {
        self.endpoint(db, self.end_node_element_id(), "end_node_element_id")
            .await
    }

    async fn endpoint(
        &self,
        db: &dyn GraphDatabase,
        element_id: Option<&str>,
        param: &str,
    ) -> Result<super::StructuredNode> {
        let element_id = element_id.ok_or_else(|| {
            Error::ExecutionError(format!(
                "relationship {} has no {param}; inflate it from the database first",
                self.class().name()
            ))
        })?;
        let id_fn = db.id_method();
        let statement = format!("MATCH (aNode) WHERE {id_fn}(aNode)=${param} RETURN aNode");
        let params =
            PropertyMap::from_iter([(param.to_string(), db.parse_element_id(element_id)?)]);
        let rows = db.cypher_query_resolved(&statement, params).await?;
        // First row, first column is the single resolved entity.
        rows.into_iter()
            .next()
            .and_then(|mut row| if row.is_empty() { None } else { Some(row.remove(0)) })
            .ok_or_else(|| Error::NotFound(format!("no node with {param}={element_id}")))?
            .into_node()
    }

    /// Persist this edge's properties: one update statement matched by
    /// element identifier, one round trip.
    pub async fn save(&self, db: &dyn GraphDatabase) -> Result<()> {
        let element_id = self.element_id().ok_or_else(|| {
            Error::ExecutionError(format!(
                "cannot save an unsaved {} relationship",
                self.class().name()
            ))
        })?;
        let deflated = self.state.deflate(false)?;
        if deflated.is_empty() {
            // Nothing to write; a bare SET is not a statement.
            return Ok(());
        }
        let id_fn = db.id_method();
        let statement = format!(
            "MATCH ()-[r]->() WHERE {id_fn}(r)=$self SET {}",
            render_set_clause("r", &deflated)
        );
        let mut params = deflated;
        params.insert("self".to_string(), db.parse_element_id(element_id)?);
        db.cypher_query(&statement, params).await?;
        Ok(())
    }
}
