//! # Class Schemas
//!
//! This is THE metadata layer of the OGM. An [`EntityClass`] is built
//! once, validated at definition time, then shared immutably:
//!
//! - [`EntityClassBuilder`] plays the metaclass role: it collects the
//!   class body's declarations, rejects reserved and duplicated names,
//!   and binds every property descriptor to its attribute name and
//!   owning class.
//! - [`ClassSpec`] is one finalized class body. An [`EntityClass`] is a
//!   chain of them, most-ancestral first.
//! - [`EntityClass::defined_properties`] merges the chain into the
//!   effective schema: a more derived class's declaration of a name
//!   replaces its ancestor's.
//! - `deflate` / `inflate_values` drive marshalling for any bag of
//!   values against that schema.

pub mod ddl;
pub mod registry;
pub mod relationship_def;

pub use registry::ClassRegistry;
pub use relationship_def::RelationshipDef;

use std::sync::Arc;

use hashbrown::HashMap;

use crate::model::{PropertyMap, Value};
use crate::properties::{AliasProperty, Property, PropertyType};
use crate::{Error, Result};

// ============================================================================
// Declarations
// ============================================================================

/// Kind of entity a class describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Relationship,
}

/// One resolved schema entry. A name maps to exactly one of these;
/// declaring a name as two kinds within one class body fails the build.
#[derive(Debug, Clone)]
pub enum Declared {
    Property(Property),
    Alias(AliasProperty),
    Relationship(RelationshipDef),
}

impl Declared {
    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Declared::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_alias(&self) -> Option<&AliasProperty> {
        match self {
            Declared::Alias(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&RelationshipDef> {
        match self {
            Declared::Relationship(r) => Some(r),
            _ => None,
        }
    }
}

/// Which declaration kinds a schema view includes. Each kind is toggled
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaFilter {
    pub aliases: bool,
    pub properties: bool,
    pub relationships: bool,
}

impl SchemaFilter {
    pub fn all() -> Self {
        SchemaFilter { aliases: true, properties: true, relationships: true }
    }

    /// The marshalling view: properties only.
    pub fn properties() -> Self {
        SchemaFilter { aliases: false, properties: true, relationships: false }
    }

    pub fn aliases() -> Self {
        SchemaFilter { aliases: true, properties: false, relationships: false }
    }

    pub fn relationships() -> Self {
        SchemaFilter { aliases: false, properties: false, relationships: true }
    }

    fn keeps(&self, declared: &Declared) -> bool {
        match declared {
            Declared::Property(_) => self.properties,
            Declared::Alias(_) => self.aliases,
            Declared::Relationship(_) => self.relationships,
        }
    }
}

// ============================================================================
// ClassSpec
// ============================================================================

/// One finalized class body: the declarations made directly on a class,
/// after the definition-time guard has validated and bound them.
#[derive(Debug)]
pub struct ClassSpec {
    name: String,
    kind: EntityKind,
    is_abstract: bool,
    declared: HashMap<String, Declared>,
}

impl ClassSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// The declarations made directly on this class (no ancestry).
    pub fn declared(&self) -> impl Iterator<Item = (&str, &Declared)> {
        self.declared.iter().map(|(name, decl)| (name.as_str(), decl))
    }
}

// ============================================================================
// EntityClassBuilder — the metaclass step
// ============================================================================

/// Reserved for the identity and endpoint machinery of relationships.
const RESERVED_REL_NAMES: [&str; 4] = ["source", "target", "id", "element_id"];
/// Reserved for node identity.
const RESERVED_NODE_NAMES: [&str; 2] = ["id", "element_id"];

enum Pending {
    Property(Arc<dyn PropertyType>),
    Alias(AliasProperty),
    Relationship(RelationshipDef),
}

/// Collects a class body, then validates and finalizes it into an
/// [`EntityClass`].
pub struct EntityClassBuilder {
    name: String,
    kind: EntityKind,
    is_abstract: bool,
    parent: Option<EntityClass>,
    pending: Vec<(String, Pending)>,
}

impl EntityClassBuilder {
    fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        EntityClassBuilder {
            name: name.into(),
            kind,
            is_abstract: false,
            parent: None,
            pending: Vec::new(),
        }
    }

    /// Abstract classes contribute declarations but no label.
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Inherit another class's full ancestry.
    pub fn extends(mut self, parent: &EntityClass) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn property(mut self, name: impl Into<String>, kind: impl PropertyType + 'static) -> Self {
        self.pending.push((name.into(), Pending::Property(Arc::new(kind))));
        self
    }

    /// Bulk declaration path; merged identically to individual calls.
    pub fn fields(
        mut self,
        fields: impl IntoIterator<Item = (String, Arc<dyn PropertyType>)>,
    ) -> Self {
        for (name, kind) in fields {
            self.pending.push((name, Pending::Property(kind)));
        }
        self
    }

    pub fn alias(mut self, name: impl Into<String>, to: impl Into<String>) -> Self {
        self.pending.push((name.into(), Pending::Alias(AliasProperty::new(to))));
        self
    }

    pub fn relationship(mut self, name: impl Into<String>, def: RelationshipDef) -> Self {
        self.pending.push((name.into(), Pending::Relationship(def)));
        self
    }

    /// Run the definition-time guard and finalize the class.
    ///
    /// Order-independent over the declarations: only name collisions and
    /// reserved names matter.
    pub fn build(self) -> Result<EntityClass> {
        let definition_error = |message: String| Error::Definition {
            class: self.name.clone(),
            message,
        };

        if let Some(parent) = &self.parent {
            if parent.kind() != self.kind {
                return Err(definition_error(format!(
                    "cannot extend {} class '{}' with a {:?} class",
                    match parent.kind() {
                        EntityKind::Node => "node",
                        EntityKind::Relationship => "relationship",
                    },
                    parent.name(),
                    self.kind,
                )));
            }
        }

        let reserved: &[&str] = match self.kind {
            EntityKind::Node => &RESERVED_NODE_NAMES,
            EntityKind::Relationship => &RESERVED_REL_NAMES,
        };

        let mut declared: HashMap<String, Declared> = HashMap::with_capacity(self.pending.len());
        for (name, pending) in self.pending {
            if reserved.contains(&name.as_str()) {
                return Err(definition_error(format!(
                    "Property name '{name}' is not allowed as it conflicts with \
                     neomodel internals. Consider using 'uid' or 'identifier' instead."
                )));
            }
            if declared.contains_key(&name) {
                return Err(definition_error(format!(
                    "'{name}' is declared more than once in the class body"
                )));
            }
            let entry = match pending {
                // Binding runs the option guard and the setup hook, once.
                Pending::Property(kind) => {
                    Declared::Property(Property::bind(&name, &self.name, kind)?)
                }
                Pending::Alias(alias) => {
                    if alias.aliased_to() == name {
                        return Err(definition_error(format!(
                            "alias '{name}' cannot point at itself"
                        )));
                    }
                    Declared::Alias(alias)
                }
                Pending::Relationship(def) => Declared::Relationship(def),
            };
            declared.insert(name, entry);
        }

        let spec = Arc::new(ClassSpec {
            name: self.name,
            kind: self.kind,
            is_abstract: self.is_abstract,
            declared,
        });
        let mut ancestry = self
            .parent
            .map(|parent| parent.ancestry)
            .unwrap_or_default();
        ancestry.push(spec);
        Ok(EntityClass { kind: self.kind, ancestry })
    }
}

// ============================================================================
// EntityClass — ancestry chain + schema resolution
// ============================================================================

/// A registered entity class: an immutable ancestry chain of class
/// specs, most-ancestral first. Cloning shares the chain.
#[derive(Debug, Clone)]
pub struct EntityClass {
    kind: EntityKind,
    ancestry: Vec<Arc<ClassSpec>>,
}

impl EntityClass {
    /// Start a node class definition.
    pub fn node(name: impl Into<String>) -> EntityClassBuilder {
        EntityClassBuilder::new(name, EntityKind::Node)
    }

    /// Start a relationship class definition.
    pub fn rel(name: impl Into<String>) -> EntityClassBuilder {
        EntityClassBuilder::new(name, EntityKind::Relationship)
    }

    /// The most derived class's name.
    pub fn name(&self) -> &str {
        // An EntityClass always has at least its own spec.
        self.ancestry.last().map(|s| s.name()).unwrap_or_default()
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// The ancestry chain, most-ancestral first.
    pub fn ancestry(&self) -> &[Arc<ClassSpec>] {
        &self.ancestry
    }

    /// The relationship type this class maps to (its name).
    pub fn rel_type(&self) -> &str {
        self.name()
    }

    /// One label per non-abstract ancestor, ancestry order.
    pub fn inherited_labels(&self) -> Vec<String> {
        self.ancestry
            .iter()
            .filter(|spec| !spec.is_abstract())
            .map(|spec| spec.name().to_string())
            .collect()
    }

    /// The effective schema: every ancestor's declarations merged in
    /// ancestry order, so a more derived declaration of a name replaces
    /// its ancestor's, filtered by kind.
    pub fn defined_properties(&self, filter: SchemaFilter) -> HashMap<String, Declared> {
        let mut resolved = HashMap::new();
        for spec in &self.ancestry {
            for (name, declared) in spec.declared() {
                resolved.insert(name.to_string(), declared.clone());
            }
        }
        resolved.retain(|_, declared| filter.keeps(declared));
        resolved
    }

    /// The resolved property descriptor for `name`, following one level
    /// of aliasing.
    pub fn property(&self, name: &str) -> Option<Property> {
        let schema = self.defined_properties(SchemaFilter {
            aliases: true,
            properties: true,
            relationships: false,
        });
        match schema.get(name)? {
            Declared::Property(p) => Some(p.clone()),
            Declared::Alias(alias) => schema
                .get(alias.aliased_to())
                .and_then(Declared::as_property)
                .cloned(),
            Declared::Relationship(_) => None,
        }
    }

    /// Marshal a bag of application values into wire values, keyed by
    /// each property's wire name.
    ///
    /// Per property, in precedence order: an explicit non-null value is
    /// deflated; else a declared default is materialized and deflated;
    /// else a required property fails; else the key is omitted
    /// (`skip_empty`) or emitted as a wire null.
    pub fn deflate(&self, bag: &PropertyMap, skip_empty: bool) -> Result<PropertyMap> {
        let mut deflated = PropertyMap::new();
        for (name, declared) in self.defined_properties(SchemaFilter::properties()) {
            let Declared::Property(property) = declared else { continue };
            let db_property = property.db_property_name().to_string();
            match bag.get(&name) {
                Some(value) if !value.is_null() => {
                    deflated.insert(db_property, property.deflate(value)?);
                }
                _ => {
                    if let Some(default) = property.default_value() {
                        deflated.insert(db_property, property.deflate(&default)?);
                    } else if property.required() {
                        return Err(Error::RequiredProperty {
                            property: name,
                            class: self.name().to_string(),
                        });
                    } else if !skip_empty {
                        deflated.insert(db_property, Value::Null);
                    }
                }
            }
        }
        Ok(deflated)
    }

    /// Marshal a raw entity's wire values into application values keyed
    /// by attribute name. Wire names absent from the entity fall back to
    /// the declared default, then to null; nothing else is fabricated.
    pub fn inflate_values(&self, raw: &PropertyMap) -> Result<PropertyMap> {
        let mut inflated = PropertyMap::new();
        for (name, declared) in self.defined_properties(SchemaFilter::properties()) {
            let Declared::Property(property) = declared else { continue };
            let value = match raw.get(property.db_property_name()) {
                Some(wire) => property.inflate(wire)?,
                None => property.default_value().unwrap_or(Value::Null),
            };
            inflated.insert(name, value);
        }
        Ok(inflated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::props;
    use crate::properties::{IntegerProperty, StringProperty};
    use pretty_assertions::assert_eq;

    fn animal() -> EntityClass {
        EntityClass::node("Animal")
            .abstract_class()
            .property("name", StringProperty::new().required(true))
            .property("legs", IntegerProperty::new().default(4))
            .build()
            .unwrap()
    }

    #[test]
    fn test_subclass_overrides_ancestor_descriptor() {
        let animal = animal();
        let bird = EntityClass::node("Bird")
            .extends(&animal)
            .property("legs", IntegerProperty::new().default(2))
            .build()
            .unwrap();

        let schema = bird.defined_properties(SchemaFilter::properties());
        let legs = schema.get("legs").and_then(Declared::as_property).unwrap();
        assert_eq!(legs.owner(), "Bird");
        assert_eq!(legs.default_value(), Some(Value::Int(2)));
        // The ancestor's other declarations survive untouched.
        let name = schema.get("name").and_then(Declared::as_property).unwrap();
        assert_eq!(name.owner(), "Animal");
    }

    #[test]
    fn test_filters_are_independent() {
        let person = EntityClass::node("Person")
            .property("name", StringProperty::new())
            .alias("full_name", "name")
            .relationship("city", RelationshipDef::relationship_to("City", "LIVES_IN"))
            .build()
            .unwrap();

        assert_eq!(person.defined_properties(SchemaFilter::properties()).len(), 1);
        assert_eq!(person.defined_properties(SchemaFilter::aliases()).len(), 1);
        assert_eq!(person.defined_properties(SchemaFilter::relationships()).len(), 1);
        assert_eq!(person.defined_properties(SchemaFilter::all()).len(), 3);
    }

    #[test]
    fn test_reserved_names_fail_class_definition() {
        for name in ["source", "target", "id", "element_id"] {
            let err = EntityClass::rel("Friendship")
                .property(name, StringProperty::new())
                .build()
                .unwrap_err();
            assert!(err.to_string().contains("not allowed"), "{name}: {err}");
        }
        // Nodes reserve the identity names only.
        assert!(
            EntityClass::node("Person")
                .property("element_id", StringProperty::new())
                .build()
                .is_err()
        );
        assert!(
            EntityClass::node("Person")
                .property("source", StringProperty::new())
                .build()
                .is_ok()
        );
    }

    #[test]
    fn test_duplicate_names_fail_class_definition() {
        let err = EntityClass::node("Person")
            .property("name", StringProperty::new())
            .alias("name", "other")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_inherited_labels_skip_abstract_ancestors() {
        let animal = animal();
        let bird = EntityClass::node("Bird").extends(&animal).build().unwrap();
        assert_eq!(bird.inherited_labels(), vec!["Bird".to_string()]);

        let concrete = EntityClass::node("Penguin")
            .extends(
                &EntityClass::node("Bird2").extends(&animal).build().unwrap(),
            )
            .build()
            .unwrap();
        assert_eq!(
            concrete.inherited_labels(),
            vec!["Bird2".to_string(), "Penguin".to_string()]
        );
    }

    #[test]
    fn test_kind_mismatch_on_extends() {
        let animal = animal();
        let err = EntityClass::rel("Eats").extends(&animal).build().unwrap_err();
        assert!(err.to_string().contains("cannot extend"));
    }

    #[test]
    fn test_property_follows_alias() {
        let person = EntityClass::node("Person")
            .property("name", StringProperty::new())
            .alias("full_name", "name")
            .build()
            .unwrap();
        assert_eq!(person.property("full_name").unwrap().name(), "name");
    }

    #[test]
    fn test_deflate_uses_wire_names() {
        let person = EntityClass::node("Person")
            .property("name", StringProperty::new().db_property("full_name"))
            .build()
            .unwrap();
        let wire = person
            .deflate(&props([("name", Value::from("Ada"))]), true)
            .unwrap();
        assert_eq!(wire.get("full_name"), Some(&Value::from("Ada")));
        assert!(!wire.contains_key("name"));
    }

    #[test]
    fn test_deflate_missing_required_names_property_and_class() {
        let person = EntityClass::node("Person")
            .property("name", StringProperty::new().required(true))
            .build()
            .unwrap();
        let err = person.deflate(&PropertyMap::new(), false).unwrap_err();
        match err {
            Error::RequiredProperty { property, class } => {
                assert_eq!(property, "name");
                assert_eq!(class, "Person");
            }
            other => panic!("expected RequiredProperty, got {other:?}"),
        }
    }

    #[test]
    fn test_deflate_skip_empty() {
        let person = EntityClass::node("Person")
            .property("nickname", StringProperty::new())
            .build()
            .unwrap();
        let wire = person.deflate(&PropertyMap::new(), false).unwrap();
        assert_eq!(wire.get("nickname"), Some(&Value::Null));
        let wire = person.deflate(&PropertyMap::new(), true).unwrap();
        assert!(wire.is_empty());
    }

    #[test]
    fn test_inflate_values_fills_defaults_then_null() {
        let animal = animal();
        let values = animal
            .inflate_values(&props([("name", Value::from("Rex"))]))
            .unwrap();
        assert_eq!(values.get("name"), Some(&Value::from("Rex")));
        assert_eq!(values.get("legs"), Some(&Value::Int(4)));

        let person = EntityClass::node("Person")
            .property("nickname", StringProperty::new())
            .build()
            .unwrap();
        let values = person.inflate_values(&PropertyMap::new()).unwrap();
        assert_eq!(values.get("nickname"), Some(&Value::Null));
    }
}
