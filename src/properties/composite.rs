//! Composite property descriptors: homogeneous arrays, JSON-string
//! structures, and aliases onto other properties.

use std::sync::Arc;

use crate::model::Value;
use crate::properties::{PropertyOptions, PropertyType, property_builder_methods};

// ============================================================================
// ArrayProperty
// ============================================================================

/// Stores a list of items, optionally of a specific type.
///
/// With a base property every element is marshalled through it; element
/// failures surface as-is (the array descriptor supplies property and
/// class context when bound). Without one, any list passes through.
#[derive(Debug, Clone)]
pub struct ArrayProperty {
    options: PropertyOptions,
    base_property: Option<Arc<dyn PropertyType>>,
}

impl ArrayProperty {
    /// An untyped list.
    pub fn new() -> Self {
        ArrayProperty { options: PropertyOptions::default(), base_property: None }
    }

    /// A list whose items are marshalled through `base_property`.
    pub fn of(base_property: impl PropertyType + 'static) -> Self {
        ArrayProperty {
            options: PropertyOptions::default(),
            base_property: Some(Arc::new(base_property)),
        }
    }

    property_builder_methods!();

    fn map_items(
        &self,
        value: &Value,
        mut marshal: impl FnMut(&dyn PropertyType, &Value) -> std::result::Result<Value, String>,
    ) -> std::result::Result<Value, String> {
        let items = match value {
            Value::List(items) => items,
            other => return Err(format!("Expected a list, got {}", other.type_name())),
        };
        match &self.base_property {
            Some(base) => items
                .iter()
                .map(|item| marshal(base.as_ref(), item))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::List),
            None => Ok(Value::List(items.clone())),
        }
    }
}

impl PropertyType for ArrayProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "array"
    }

    fn setup(&self) -> std::result::Result<(), String> {
        let Some(base) = &self.base_property else { return Ok(()) };
        if base.type_name() == "array" {
            return Err("Cannot have nested ArrayProperty".to_string());
        }
        let base_options = base.options();
        for (flag, set) in [
            ("default", base_options.has_default()),
            ("index", base_options.index),
            ("unique_index", base_options.unique_index),
            ("required", base_options.required),
        ] {
            if set {
                return Err(format!(
                    "ArrayProperty base_property cannot have \"{flag}\" set"
                ));
            }
        }
        Ok(())
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.map_items(value, |base, item| base.inflate(item))
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        self.map_items(value, |base, item| base.deflate(item))
    }
}

// ============================================================================
// JsonProperty
// ============================================================================

/// Stores a data structure as a JSON string.
///
/// The structure is inflated back when an entity is retrieved.
#[derive(Debug, Clone)]
pub struct JsonProperty {
    options: PropertyOptions,
}

impl JsonProperty {
    pub fn new() -> Self {
        JsonProperty { options: PropertyOptions::default() }
    }

    property_builder_methods!();
}

impl PropertyType for JsonProperty {
    fn options(&self) -> &PropertyOptions {
        &self.options
    }

    fn type_name(&self) -> &'static str {
        "json"
    }

    fn inflate(&self, value: &Value) -> std::result::Result<Value, String> {
        let text = match value {
            Value::String(s) => s,
            other => return Err(format!("Expected a JSON string, got {}", other.type_name())),
        };
        serde_json::from_str::<serde_json::Value>(text)
            .map(Value::from_json)
            .map_err(|e| format!("invalid JSON: {e}"))
    }

    fn deflate(&self, value: &Value) -> std::result::Result<Value, String> {
        let json = value.to_json()?;
        serde_json::to_string(&json)
            .map(Value::String)
            .map_err(|e| format!("cannot serialize to JSON: {e}"))
    }
}

// ============================================================================
// AliasProperty
// ============================================================================

/// Aliases another property on the same class.
///
/// An alias is a pass-through view, never marshalled itself: reads and
/// writes through the alias name land on the target property's slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasProperty {
    target: String,
}

impl AliasProperty {
    pub fn new(to: impl Into<String>) -> Self {
        AliasProperty { target: to.into() }
    }

    /// The name of the property this alias points at.
    pub fn aliased_to(&self) -> &str {
        &self.target
    }
}
