//! # Property Descriptors
//!
//! A property descriptor pairs marshalling logic with declaration options
//! (required, defaults, index flags, wire name). Descriptors are written
//! against [`PropertyType`] and stay pure: `inflate` takes a wire value
//! and returns the application value, `deflate` goes the other way, and
//! both report failures as plain messages.
//!
//! Binding a descriptor to a class (see [`Property`]) adds the context a
//! plain message lacks: which attribute, on which class. All inflate and
//! deflate failures surface as [`crate::Error::Inflate`] /
//! [`crate::Error::Deflate`] carrying that context.

use std::fmt;
use std::sync::Arc;

use crate::model::Value;
use crate::{Error, Result};

pub mod scalars;
pub mod temporal;
pub mod composite;

pub use scalars::{
    BooleanProperty, EmailProperty, FloatProperty, IntegerProperty, RegexProperty,
    StringProperty, UniqueIdProperty,
};
pub use temporal::{
    DateProperty, DateTimeFormatProperty, DateTimeNeo4jFormatProperty, DateTimeProperty,
};
pub use composite::{AliasProperty, ArrayProperty, JsonProperty};

// ============================================================================
// Index definitions
// ============================================================================

/// Fulltext index definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FulltextIndex {
    pub analyzer: String,
    pub eventually_consistent: bool,
}

impl Default for FulltextIndex {
    fn default() -> Self {
        FulltextIndex {
            analyzer: "standard-no-stop-words".to_string(),
            eventually_consistent: false,
        }
    }
}

impl FulltextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = analyzer.into();
        self
    }

    pub fn eventually_consistent(mut self, eventually_consistent: bool) -> Self {
        self.eventually_consistent = eventually_consistent;
        self
    }
}

/// Vector index definition.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    pub dimensions: usize,
    pub similarity_function: String,
}

impl Default for VectorIndex {
    fn default() -> Self {
        VectorIndex { dimensions: 1536, similarity_function: "cosine".to_string() }
    }
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn similarity_function(mut self, similarity_function: impl Into<String>) -> Self {
        self.similarity_function = similarity_function.into();
        self
    }
}

// ============================================================================
// Defaults
// ============================================================================

/// A declared default: either a literal value or a producer invoked
/// fresh every time the default is materialized.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn materialize(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Producer(produce) => produce(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

// ============================================================================
// Declaration options
// ============================================================================

/// Options shared by every property descriptor.
#[derive(Debug, Clone, Default)]
pub struct PropertyOptions {
    pub required: bool,
    pub unique_index: bool,
    pub index: bool,
    pub fulltext_index: Option<FulltextIndex>,
    pub vector_index: Option<VectorIndex>,
    pub default: Option<DefaultValue>,
    pub db_property: Option<String>,
}

impl PropertyOptions {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_indexed(&self) -> bool {
        self.unique_index || self.index
    }

    /// The declared default, if it is a literal.
    pub fn literal_default(&self) -> Option<&Value> {
        match &self.default {
            Some(DefaultValue::Literal(value)) => Some(value),
            _ => None,
        }
    }

    pub fn default_value(&self) -> Option<Value> {
        self.default.as_ref().map(DefaultValue::materialize)
    }

    /// Cross-flag guard, run when the descriptor is bound to a class.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.required && self.default.is_some() {
            return Err("The arguments `required` and `default` are mutually exclusive.".to_string());
        }
        if self.unique_index && self.index {
            return Err("The arguments `unique_index` and `index` are mutually exclusive.".to_string());
        }
        Ok(())
    }
}

/// Builder methods shared by the concrete descriptor types. Expects a
/// `self.options: PropertyOptions` field on the surrounding type.
macro_rules! property_builder_methods {
    () => {
        pub fn required(mut self, required: bool) -> Self {
            self.options.required = required;
            self
        }

        pub fn index(mut self, index: bool) -> Self {
            self.options.index = index;
            self
        }

        pub fn unique_index(mut self, unique_index: bool) -> Self {
            self.options.unique_index = unique_index;
            self
        }

        pub fn fulltext_index(
            mut self,
            fulltext_index: $crate::properties::FulltextIndex,
        ) -> Self {
            self.options.fulltext_index = Some(fulltext_index);
            self
        }

        pub fn vector_index(mut self, vector_index: $crate::properties::VectorIndex) -> Self {
            self.options.vector_index = Some(vector_index);
            self
        }

        pub fn default(mut self, default: impl Into<$crate::model::Value>) -> Self {
            self.options.default =
                Some($crate::properties::DefaultValue::Literal(default.into()));
            self
        }

        pub fn default_with(
            mut self,
            produce: impl Fn() -> $crate::model::Value + Send + Sync + 'static,
        ) -> Self {
            self.options.default = Some($crate::properties::DefaultValue::Producer(
                std::sync::Arc::new(produce),
            ));
            self
        }

        pub fn db_property(mut self, db_property: impl Into<String>) -> Self {
            self.options.db_property = Some(db_property.into());
            self
        }
    };
}
pub(crate) use property_builder_methods;

// ============================================================================
// The descriptor contract
// ============================================================================

/// Marshalling contract implemented by every property descriptor.
///
/// `inflate` and `deflate` are pure: no context, no logging, failures as
/// plain messages. The bound [`Property`] adds attribute and class
/// context on the way out.
pub trait PropertyType: fmt::Debug + Send + Sync {
    fn options(&self) -> &PropertyOptions;

    fn type_name(&self) -> &'static str;

    /// Wire value → application value.
    fn inflate(&self, value: &Value) -> std::result::Result<Value, String>;

    /// Application value → wire value.
    fn deflate(&self, value: &Value) -> std::result::Result<Value, String>;

    /// Definition-time hook, run once when the descriptor is bound to a
    /// class. Descriptors use it to reject impossible declarations.
    fn setup(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Valid (value, display label) pairs, for descriptors that restrict
    /// their values to a fixed set.
    fn choices(&self) -> Option<&[(String, String)]> {
        None
    }
}

// ============================================================================
// Bound descriptor
// ============================================================================

/// A descriptor bound to its class: knows its attribute name and owning
/// class, and wraps marshalling failures with that context.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    owner: String,
    kind: Arc<dyn PropertyType>,
}

impl Property {
    /// Bind a descriptor to `owner.name`, running the definition-time
    /// checks (option flags, then the descriptor's own setup hook).
    pub(crate) fn bind(name: &str, owner: &str, kind: Arc<dyn PropertyType>) -> Result<Self> {
        let definition_error = |message: String| Error::Definition {
            class: owner.to_string(),
            message: format!("property '{name}': {message}"),
        };
        kind.options().validate().map_err(&definition_error)?;
        kind.setup().map_err(definition_error)?;
        Ok(Property {
            name: name.to_string(),
            owner: owner.to_string(),
            kind,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn options(&self) -> &PropertyOptions {
        self.kind.options()
    }

    pub fn required(&self) -> bool {
        self.kind.options().required
    }

    pub fn has_default(&self) -> bool {
        self.kind.options().has_default()
    }

    /// Materialize the declared default; a fresh call for producers.
    pub fn default_value(&self) -> Option<Value> {
        self.kind.options().default_value()
    }

    /// The name this property maps to in the database: `db_property` if
    /// declared, otherwise the attribute name.
    pub fn db_property_name(&self) -> &str {
        self.kind.options().db_property.as_deref().unwrap_or(&self.name)
    }

    pub fn choices(&self) -> Option<&[(String, String)]> {
        self.kind.choices()
    }

    pub fn inflate(&self, value: &Value) -> Result<Value> {
        self.kind.inflate(value).map_err(|message| Error::Inflate {
            property: self.name.clone(),
            class: self.owner.clone(),
            message,
        })
    }

    pub fn deflate(&self, value: &Value) -> Result<Value> {
        self.kind.deflate(value).map_err(|message| Error::Deflate {
            property: self.name.clone(),
            class: self.owner.clone(),
            message,
        })
    }
}
