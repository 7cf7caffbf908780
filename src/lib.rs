//! # neomodel-rs — Object-Graph Mapping for Property Graphs
//!
//! A typed OGM layer over Neo4j-compatible property graphs in Rust.
//!
//! ## Design Principles
//!
//! 1. **Schema-first**: classes are built once, validated at definition time, then shared as `Arc`s
//! 2. **Clean DTOs**: `Node`, `Relationship`, `Value` cross all boundaries
//! 3. **Strict marshalling**: `inflate` (wire → application) and `deflate` (application → wire) never guess
//! 4. **Backend-agnostic entities**: `StructuredNode` / `StructuredRel` talk to any [`GraphDatabase`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use neomodel_rs::{
//!     ClassRegistry, EntityClass, IntegerProperty, LocalGraph, StringProperty,
//!     StructuredNode, Value, props,
//! };
//!
//! # async fn example() -> neomodel_rs::Result<()> {
//! // Define a class
//! let person = EntityClass::node("Person")
//!     .property("name", StringProperty::new().required(true))
//!     .property("age", IntegerProperty::new().default(0))
//!     .build()?;
//!
//! let registry = Arc::new(ClassRegistry::new());
//! registry.register_node(&person)?;
//!
//! // Persist an instance
//! let graph = LocalGraph::new(registry);
//! let mut ada = StructuredNode::new(&person, props([("name", Value::from("Ada"))]))?;
//! ada.save(&graph).await?;
//! println!("{:?}", ada.element_id());
//! # Ok(())
//! # }
//! ```
//!
//! ## Property Types
//!
//! | Type | Application value | Wire value |
//! |------|-------------------|------------|
//! | `StringProperty` | string (choices / max_length checked) | string |
//! | `RegexProperty` / `EmailProperty` | string matching an expression | string |
//! | `IntegerProperty` / `FloatProperty` / `BooleanProperty` | scalar | scalar |
//! | `DateProperty` | calendar date | ISO-8601 string |
//! | `DateTimeProperty` | zoned datetime | UTC epoch float |
//! | `DateTimeNeo4jFormatProperty` | naive datetime | native temporal |
//! | `ArrayProperty` | list (optionally element-typed) | list |
//! | `JsonProperty` | any value | JSON string |
//! | `PointProperty` | [`NeomodelPoint`] | SRID-tagged point |
//! | `UniqueIdProperty` | hex uuid string | string |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod properties;
pub mod spatial;
pub mod schema;
pub mod entity;
pub mod db;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Node, Relationship, Value, PropertyMap,
    NodeId, RelId, Direction, IsoDuration, props,
};

// ============================================================================
// Re-exports: Property descriptors
// ============================================================================

pub use properties::{
    Property, PropertyType, PropertyOptions, DefaultValue,
    FulltextIndex, VectorIndex,
    StringProperty, RegexProperty, EmailProperty,
    IntegerProperty, FloatProperty, BooleanProperty, UniqueIdProperty,
    DateProperty, DateTimeProperty, DateTimeFormatProperty,
    DateTimeNeo4jFormatProperty,
    ArrayProperty, JsonProperty, AliasProperty,
};

// ============================================================================
// Re-exports: Spatial
// ============================================================================

pub use spatial::{Crs, NeomodelPoint, PointBuilder, PointProperty};

// ============================================================================
// Re-exports: Schema
// ============================================================================

pub use schema::{
    ClassRegistry, ClassSpec, Declared, EntityClass, EntityClassBuilder,
    EntityKind, RelationshipDef, SchemaFilter,
};

// ============================================================================
// Re-exports: Entities
// ============================================================================

pub use entity::{PropertyState, StructuredNode, StructuredRel};

// ============================================================================
// Re-exports: Database
// ============================================================================

pub use db::{GraphDatabase, LocalGraph, QueryResult, Resolved};

// ============================================================================
// Error Types
// ============================================================================

/// Notice attached to legacy integer-id access against a Neo4j 5 style
/// string element id.
pub const ELEMENT_ID_MIGRATION_NOTICE: &str =
    "id is deprecated in Neo4j version 5, please migrate to element_id. \
     If you use the id in a Cypher query, replace id() by elementId()";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Definition error on {class}: {message}")]
    Definition { class: String, message: String },

    #[error("Attempting to inflate property '{property}' on {class}: {message}")]
    Inflate { property: String, class: String, message: String },

    #[error("Attempting to deflate property '{property}' on {class}: {message}")]
    Deflate { property: String, class: String, message: String },

    #[error("property '{property}' on objects of class {class} is required and has no default")]
    RequiredProperty { property: String, class: String },

    #[error("Spatial error: {0}")]
    Spatial(String),

    #[error("{notice} (element_id was {eid:?})", notice = ELEMENT_ID_MIGRATION_NOTICE, eid = .0)]
    ElementIdMigration(Option<String>),

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("No class registered for {0}")]
    ClassNotRegistered(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
