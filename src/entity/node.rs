//! Node entities.

use crate::db::{GraphDatabase, QueryResult};
use crate::model::{Node, PropertyMap, Value};
use crate::schema::EntityClass;
use crate::{Error, Result};

use super::{legacy_id, render_set_clause, PropertyState};

/// A typed node instance bound to an [`EntityClass`].
///
/// Unsaved instances have no element identifier; `save` assigns one on
/// first create and updates in place thereafter. Every database
/// operation is exactly one round trip through the collaborator.
#[derive(Debug, Clone)]
pub struct StructuredNode {
    state: PropertyState,
    element_id: Option<String>,
}

impl StructuredNode {
    /// Construct an unsaved instance from a kwargs-style bag.
    pub fn new(class: &EntityClass, kwargs: PropertyMap) -> Result<Self> {
        Ok(StructuredNode {
            state: PropertyState::new(class, kwargs)?,
            element_id: None,
        })
    }

    /// Reconstruct an instance from a raw node row.
    pub fn inflate(class: &EntityClass, raw: &Node) -> Result<Self> {
        let values = class.inflate_values(&raw.properties)?;
        let mut node = StructuredNode::new(class, values)?;
        node.element_id = raw
            .element_id
            .clone()
            .or_else(|| Some(raw.id.to_string()));
        Ok(node)
    }

    pub fn class(&self) -> &EntityClass {
        self.state.class()
    }

    pub fn state(&self) -> &PropertyState {
        &self.state
    }

    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    /// Legacy integer identifier view.
    pub fn id(&self) -> Result<i64> {
        legacy_id(self.element_id())
    }

    pub fn labels(&self) -> Vec<String> {
        self.class().inherited_labels()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.state.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.state.set(name, value);
    }

    /// The canonical savable view of this instance.
    pub fn properties(&self) -> PropertyMap {
        self.state.properties()
    }

    /// Persist this instance: create on first save, update by element
    /// identifier afterwards. One round trip either way.
    pub async fn save(&mut self, db: &dyn GraphDatabase) -> Result<()> {
        let deflated = self.state.deflate(false)?;
        match &self.element_id {
            None => {
                let labels = self.labels().join(":");
                let statement = if labels.is_empty() {
                    "CREATE (n $props) RETURN n".to_string()
                } else {
                    format!("CREATE (n:{labels} $props) RETURN n")
                };
                let params =
                    PropertyMap::from_iter([("props".to_string(), Value::Map(deflated))]);
                let result = db.cypher_query(&statement, params).await?;
                let raw = first_node(result)?;
                self.element_id = raw.element_id.clone().or_else(|| Some(raw.id.to_string()));
            }
            Some(element_id) => {
                if deflated.is_empty() {
                    return Ok(());
                }
                let id_fn = db.id_method();
                let statement = format!(
                    "MATCH (n) WHERE {id_fn}(n)=$self SET {} RETURN n",
                    render_set_clause("n", &deflated)
                );
                let mut params = deflated;
                params.insert("self".to_string(), db.parse_element_id(element_id)?);
                db.cypher_query(&statement, params).await?;
            }
        }
        Ok(())
    }

    /// Construct and save one instance per kwargs bag.
    pub async fn create(
        class: &EntityClass,
        bags: Vec<PropertyMap>,
        db: &dyn GraphDatabase,
    ) -> Result<Vec<StructuredNode>> {
        let mut saved = Vec::with_capacity(bags.len());
        for bag in bags {
            let mut node = StructuredNode::new(class, bag)?;
            node.save(db).await?;
            saved.push(node);
        }
        Ok(saved)
    }

    /// Delete the persisted node. The instance reverts to unsaved.
    pub async fn delete(&mut self, db: &dyn GraphDatabase) -> Result<()> {
        let element_id = self.require_saved("delete")?;
        let id_fn = db.id_method();
        let statement = format!("MATCH (n) WHERE {id_fn}(n)=$self DETACH DELETE n");
        let params =
            PropertyMap::from_iter([("self".to_string(), db.parse_element_id(&element_id)?)]);
        db.cypher_query(&statement, params).await?;
        self.element_id = None;
        Ok(())
    }

    /// Reload this instance's properties from the database.
    pub async fn refresh(&mut self, db: &dyn GraphDatabase) -> Result<()> {
        let element_id = self.require_saved("refresh")?;
        let id_fn = db.id_method();
        let statement = format!("MATCH (n) WHERE {id_fn}(n)=$self RETURN n");
        let params =
            PropertyMap::from_iter([("self".to_string(), db.parse_element_id(&element_id)?)]);
        let result = db.cypher_query(&statement, params).await?;
        let raw = first_node(result)?;
        let class = self.class().clone();
        let values = class.inflate_values(&raw.properties)?;
        self.state = PropertyState::new(&class, values)?;
        Ok(())
    }

    /// Run an arbitrary statement with `$self` bound to this node's
    /// identifier, returning raw rows.
    pub async fn cypher(
        &self,
        statement: &str,
        mut params: PropertyMap,
        db: &dyn GraphDatabase,
    ) -> Result<QueryResult> {
        let element_id = self.require_saved("run a query against")?;
        params.insert("self".to_string(), db.parse_element_id(&element_id)?);
        db.cypher_query(statement, params).await
    }

    fn require_saved(&self, operation: &str) -> Result<String> {
        self.element_id.clone().ok_or_else(|| {
            Error::ExecutionError(format!(
                "cannot {operation} an unsaved {} node",
                self.class().name()
            ))
        })
    }
}

fn first_node(result: QueryResult) -> Result<Node> {
    match result.rows.into_iter().next().and_then(|row| row.into_iter().next()) {
        Some(Value::Node(raw)) => Ok(*raw),
        Some(other) => Err(Error::TypeError {
            expected: "NODE".to_string(),
            got: other.type_name().to_string(),
        }),
        None => Err(Error::NotFound("no node returned".to_string())),
    }
}
