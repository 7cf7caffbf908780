//! # Entity Runtime
//!
//! [`PropertyState`] is the property manager behind every node and
//! relationship instance: one slot per resolved property name, an
//! explicit side map for free-form extras, and the canonical savable
//! view [`PropertyState::properties`].

pub mod node;
pub mod relationship;

pub use node::StructuredNode;
pub use relationship::StructuredRel;

use hashbrown::HashMap;

use crate::model::{PropertyMap, Value};
use crate::schema::{Declared, EntityClass, SchemaFilter};
use crate::Result;

// ============================================================================
// PropertyState
// ============================================================================

/// Per-instance property storage resolved against a class schema.
///
/// A slot holding `None` is the unset sentinel: the property exists on
/// the instance but no value was supplied and no default was declared.
/// That is distinct from a slot holding `Value::Null`, though deflate
/// treats the two alike.
#[derive(Debug, Clone)]
pub struct PropertyState {
    class: EntityClass,
    slots: HashMap<String, Option<Value>>,
    extras: PropertyMap,
}

impl PropertyState {
    /// Initialize an instance from a kwargs-style bag.
    ///
    /// Per resolved property: a supplied non-null value is assigned
    /// verbatim (validation is deferred to deflate); a null or missing
    /// value materializes the declared default, fresh per instance; with
    /// no default the slot is left unset. Aliases assign through to
    /// their target. Anything left over lands in the extras map.
    pub fn new(class: &EntityClass, mut kwargs: PropertyMap) -> Result<Self> {
        let mut slots = HashMap::new();
        for (name, declared) in class.defined_properties(SchemaFilter::properties()) {
            let Declared::Property(property) = declared else { continue };
            let slot = match kwargs.remove(&name) {
                Some(value) if !value.is_null() => Some(value),
                _ => property.default_value(),
            };
            slots.insert(name, slot);
        }

        let mut state = PropertyState {
            class: class.clone(),
            slots,
            extras: PropertyMap::new(),
        };

        for (name, declared) in class.defined_properties(SchemaFilter::aliases()) {
            let Declared::Alias(alias) = declared else { continue };
            if let Some(value) = kwargs.remove(&name) {
                if let Some(slot) = state.slots.get_mut(alias.aliased_to()) {
                    *slot = Some(value);
                }
            }
        }

        // Free-form attributes: kept, surfaced in properties(), but
        // never schema-backed.
        state.extras = kwargs;
        Ok(state)
    }

    pub fn class(&self) -> &EntityClass {
        &self.class
    }

    /// Read a property, following aliases; unset slots read as `None`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(slot) = self.slots.get(name) {
            return slot.as_ref();
        }
        if let Some(target) = self.alias_target(name) {
            return self.slots.get(&target).and_then(|slot| slot.as_ref());
        }
        self.extras.get(name)
    }

    /// Assign a property verbatim, following aliases. Unknown names go
    /// to the extras map.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if let Some(slot) = self.slots.get_mut(name) {
            *slot = Some(value);
            return;
        }
        if let Some(target) = self.alias_target(name) {
            if let Some(slot) = self.slots.get_mut(&target) {
                *slot = Some(value);
                return;
            }
        }
        self.extras.insert(name.to_string(), value);
    }

    /// Whether a schema property slot holds a value.
    pub fn is_set(&self, name: &str) -> bool {
        self.slots.get(name).is_some_and(|slot| slot.is_some())
    }

    /// The canonical savable view: every schema property slot (unset
    /// reads as null) plus the extras map. Membership is decided by the
    /// resolved schema and the extras map, never by inspecting values.
    pub fn properties(&self) -> PropertyMap {
        let mut all = PropertyMap::with_capacity(self.slots.len() + self.extras.len());
        for (name, slot) in &self.slots {
            all.insert(name.clone(), slot.clone().unwrap_or(Value::Null));
        }
        for (name, value) in &self.extras {
            all.insert(name.clone(), value.clone());
        }
        all
    }

    /// Free-form attributes assigned past the schema.
    pub fn extras(&self) -> &PropertyMap {
        &self.extras
    }

    /// The display label for the current value of a choice-bearing
    /// property. `None` when the property has no choices, is unset, or
    /// holds a value outside them.
    pub fn display(&self, name: &str) -> Option<String> {
        let property = self.class.property(name)?;
        let choices = property.choices()?;
        let current = self.get(name)?.as_str()?;
        choices
            .iter()
            .find(|(value, _)| value == current)
            .map(|(_, label)| label.clone())
    }

    /// Deflate this instance's savable view against its class schema.
    pub fn deflate(&self, skip_empty: bool) -> Result<PropertyMap> {
        self.class.deflate(&self.properties(), skip_empty)
    }

    fn alias_target(&self, name: &str) -> Option<String> {
        self.class
            .defined_properties(SchemaFilter::aliases())
            .get(name)
            .and_then(Declared::as_alias)
            .map(|alias| alias.aliased_to().to_string())
    }
}

/// Legacy integer view of an element identifier. Neo4j 4.x element ids
/// are the integer id's string form; anything else must migrate.
pub(crate) fn legacy_id(element_id: Option<&str>) -> crate::Result<i64> {
    element_id
        .and_then(|eid| eid.parse::<i64>().ok())
        .ok_or_else(|| crate::Error::ElementIdMigration(element_id.map(str::to_owned)))
}

/// Render the `SET var.k = $k, ...` clause for a deflated bag, keys
/// sorted so generated statements are stable.
pub(crate) fn render_set_clause(var: &str, deflated: &PropertyMap) -> String {
    let mut keys: Vec<&String> = deflated.keys().collect();
    keys.sort();
    keys.iter()
        .map(|key| format!("{var}.{key} = ${key}"))
        .collect::<Vec<_>>()
        .join(", ")
}
