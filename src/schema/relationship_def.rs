//! Declared relationship descriptors.
//!
//! A relationship declaration on a node class names the edge type, the
//! traversal direction, and the class on the far side. Traversal itself
//! is out of scope here; the declarations exist so resolved schemas can
//! carry and filter them alongside properties and aliases.

use crate::model::Direction;

/// A relationship declared on an entity class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDef {
    rel_type: String,
    direction: Direction,
    target_class: String,
}

impl RelationshipDef {
    /// An outgoing relationship: `(this)-[:REL_TYPE]->(target)`.
    pub fn relationship_to(target_class: impl Into<String>, rel_type: impl Into<String>) -> Self {
        RelationshipDef {
            rel_type: rel_type.into(),
            direction: Direction::Outgoing,
            target_class: target_class.into(),
        }
    }

    /// An incoming relationship: `(this)<-[:REL_TYPE]-(target)`.
    pub fn relationship_from(target_class: impl Into<String>, rel_type: impl Into<String>) -> Self {
        RelationshipDef {
            rel_type: rel_type.into(),
            direction: Direction::Incoming,
            target_class: target_class.into(),
        }
    }

    /// An undirected relationship declaration.
    pub fn relationship(target_class: impl Into<String>, rel_type: impl Into<String>) -> Self {
        RelationshipDef {
            rel_type: rel_type.into(),
            direction: Direction::Both,
            target_class: target_class.into(),
        }
    }

    pub fn rel_type(&self) -> &str {
        &self.rel_type
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn target_class(&self) -> &str {
        &self.target_class
    }
}
