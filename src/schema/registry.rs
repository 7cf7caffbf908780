//! Class registry and object resolution.
//!
//! Node classes register under their full inherited label set,
//! relationship classes under their type name. Query execution uses
//! the registry to map raw graph entities back to the classes that
//! should inflate them.

use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::debug;

use super::{EntityClass, EntityKind};
use crate::model::{Node, Relationship};
use crate::{Error, Result};

/// Registry of entity classes, immutable entries once registered.
pub struct ClassRegistry {
    /// Sorted label set → node class.
    nodes: RwLock<HashMap<Vec<String>, EntityClass>>,
    /// Relationship type → relationship class.
    rels: RwLock<HashMap<String, EntityClass>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        ClassRegistry {
            nodes: RwLock::new(HashMap::new()),
            rels: RwLock::new(HashMap::new()),
        }
    }

    /// Register a node class under its full inherited label set.
    pub fn register_node(&self, class: &EntityClass) -> Result<()> {
        if class.kind() != EntityKind::Node {
            return Err(Error::Definition {
                class: class.name().to_string(),
                message: "only node classes can be registered under labels".to_string(),
            });
        }
        let key = label_key(&class.inherited_labels());
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&key) {
            return Err(Error::Definition {
                class: class.name().to_string(),
                message: format!("labels {key:?} are already registered to another class"),
            });
        }
        debug!(class = class.name(), labels = ?key, "registered node class");
        nodes.insert(key, class.clone());
        Ok(())
    }

    /// Register a relationship class under its type name.
    pub fn register_rel(&self, class: &EntityClass) -> Result<()> {
        if class.kind() != EntityKind::Relationship {
            return Err(Error::Definition {
                class: class.name().to_string(),
                message: "only relationship classes can be registered under a type".to_string(),
            });
        }
        let rel_type = class.rel_type().to_string();
        let mut rels = self.rels.write();
        if rels.contains_key(&rel_type) {
            return Err(Error::Definition {
                class: class.name().to_string(),
                message: format!("type '{rel_type}' is already registered to another class"),
            });
        }
        debug!(class = class.name(), rel_type, "registered relationship class");
        rels.insert(rel_type, class.clone());
        Ok(())
    }

    /// The class registered for exactly this raw node's label set.
    pub fn node_class(&self, node: &Node) -> Result<EntityClass> {
        let key = label_key(&node.labels);
        self.nodes.read().get(&key).cloned().ok_or_else(|| {
            Error::ClassNotRegistered(format!("node labels {:?}", node.labels))
        })
    }

    /// The class registered for this raw relationship's type, if any.
    /// Unregistered types inflate as bare relationships.
    pub fn rel_class(&self, rel: &Relationship) -> Option<EntityClass> {
        self.rels.read().get(&rel.rel_type).cloned()
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn label_key(labels: &[String]) -> Vec<String> {
    let mut key = labels.to_vec();
    key.sort();
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeId;
    use crate::properties::StringProperty;

    #[test]
    fn test_node_lookup_by_full_label_set() {
        let registry = ClassRegistry::new();
        let animal = EntityClass::node("Animal")
            .property("name", StringProperty::new())
            .build()
            .unwrap();
        let bird = EntityClass::node("Bird").extends(&animal).build().unwrap();
        registry.register_node(&animal).unwrap();
        registry.register_node(&bird).unwrap();

        // Label order on the raw node does not matter.
        let raw = Node::new(NodeId(1)).with_labels(["Bird", "Animal"]);
        assert_eq!(registry.node_class(&raw).unwrap().name(), "Bird");

        let raw = Node::new(NodeId(2)).with_labels(["Animal"]);
        assert_eq!(registry.node_class(&raw).unwrap().name(), "Animal");

        let raw = Node::new(NodeId(3)).with_labels(["Reptile"]);
        assert!(matches!(
            registry.node_class(&raw),
            Err(Error::ClassNotRegistered(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = ClassRegistry::new();
        let person = EntityClass::node("Person").build().unwrap();
        registry.register_node(&person).unwrap();
        assert!(registry.register_node(&person).is_err());
    }

    #[test]
    fn test_rel_lookup_falls_back_to_none() {
        let registry = ClassRegistry::new();
        let knows = EntityClass::rel("KNOWS").build().unwrap();
        registry.register_rel(&knows).unwrap();

        let raw = Relationship::new(crate::model::RelId(1), NodeId(1), NodeId(2), "KNOWS");
        assert_eq!(registry.rel_class(&raw).unwrap().name(), "KNOWS");

        let raw = Relationship::new(crate::model::RelId(2), NodeId(1), NodeId(2), "LIKES");
        assert!(registry.rel_class(&raw).is_none());
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let registry = ClassRegistry::new();
        let knows = EntityClass::rel("KNOWS").build().unwrap();
        assert!(registry.register_node(&knows).is_err());
        let person = EntityClass::node("Person").build().unwrap();
        assert!(registry.register_rel(&person).is_err());
    }
}
