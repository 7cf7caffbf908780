//! End-to-end tests for class definition and schema resolution.
//!
//! Each test exercises: build class hierarchy -> resolve schema ->
//! assert override/guard behavior.

use neomodel_rs::{
    ClassRegistry, Declared, EntityClass, IntegerProperty, RelationshipDef, SchemaFilter,
    StringProperty, Value,
};

// ============================================================================
// 1. Ancestry merge picks the most derived declaration of each name
// ============================================================================

#[test]
fn test_three_level_override_selection() {
    let animal = EntityClass::node("Animal")
        .abstract_class()
        .property("name", StringProperty::new().required(true))
        .property("legs", IntegerProperty::new().default(4))
        .property("sound", StringProperty::new())
        .build()
        .unwrap();
    let bird = EntityClass::node("Bird")
        .extends(&animal)
        .property("legs", IntegerProperty::new().default(2))
        .build()
        .unwrap();
    let penguin = EntityClass::node("Penguin")
        .extends(&bird)
        .property("sound", StringProperty::new().default("honk"))
        .build()
        .unwrap();

    let schema = penguin.defined_properties(SchemaFilter::properties());
    assert_eq!(schema.len(), 3);

    let owner = |name: &str| {
        schema
            .get(name)
            .and_then(Declared::as_property)
            .unwrap()
            .owner()
            .to_string()
    };
    assert_eq!(owner("name"), "Animal");
    assert_eq!(owner("legs"), "Bird");
    assert_eq!(owner("sound"), "Penguin");

    let legs = schema.get("legs").and_then(Declared::as_property).unwrap();
    assert_eq!(legs.default_value(), Some(Value::Int(2)));
}

// ============================================================================
// 2. Reserved names fail class definition, not instance construction
// ============================================================================

#[test]
fn test_reserved_names_on_relationship_classes() {
    for reserved in ["source", "target", "id", "element_id"] {
        let result = EntityClass::rel("FRIENDS_WITH")
            .property(reserved, StringProperty::new())
            .build();
        assert!(result.is_err(), "'{reserved}' should be rejected");
        assert!(result.unwrap_err().to_string().contains("not allowed"));
    }
}

#[test]
fn test_reserved_names_on_node_classes() {
    for reserved in ["id", "element_id"] {
        assert!(
            EntityClass::node("Person")
                .property(reserved, StringProperty::new())
                .build()
                .is_err(),
            "'{reserved}' should be rejected"
        );
    }
    // The endpoint names are only reserved on relationships.
    assert!(
        EntityClass::node("Person")
            .property("target", StringProperty::new())
            .build()
            .is_ok()
    );
}

// ============================================================================
// 3. One name, one kind
// ============================================================================

#[test]
fn test_name_cannot_be_two_kinds() {
    let err = EntityClass::node("Person")
        .property("city", StringProperty::new())
        .relationship("city", RelationshipDef::relationship_to("City", "LIVES_IN"))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("more than once"));
}

// ============================================================================
// 4. Both declaration paths merge identically
// ============================================================================

#[test]
fn test_bulk_fields_merge_like_individual_declarations() {
    use std::sync::Arc;
    let individual = EntityClass::node("Person")
        .property("name", StringProperty::new())
        .property("age", IntegerProperty::new())
        .build()
        .unwrap();
    let bulk = EntityClass::node("Person")
        .fields([
            ("name".to_string(), Arc::new(StringProperty::new()) as _),
            ("age".to_string(), Arc::new(IntegerProperty::new()) as _),
        ])
        .build()
        .unwrap();

    let a = individual.defined_properties(SchemaFilter::properties());
    let b = bulk.defined_properties(SchemaFilter::properties());
    assert_eq!(a.len(), b.len());
    for name in a.keys() {
        assert!(b.contains_key(name));
    }
}

// ============================================================================
// 5. Labels and registry resolution
// ============================================================================

#[test]
fn test_labels_and_registry() {
    let animal = EntityClass::node("Animal")
        .property("name", StringProperty::new())
        .build()
        .unwrap();
    let dog = EntityClass::node("Dog").extends(&animal).build().unwrap();
    assert_eq!(dog.inherited_labels(), vec!["Animal", "Dog"]);

    let registry = ClassRegistry::new();
    registry.register_node(&animal).unwrap();
    registry.register_node(&dog).unwrap();

    let raw = neomodel_rs::Node::new(neomodel_rs::NodeId(1)).with_labels(["Dog", "Animal"]);
    assert_eq!(registry.node_class(&raw).unwrap().name(), "Dog");
}

// ============================================================================
// 6. DDL generation from property options
// ============================================================================

#[test]
fn test_schema_statements() {
    let person = EntityClass::node("Person")
        .property("uid", StringProperty::new().unique_index(true))
        .property("name", StringProperty::new().index(true))
        .build()
        .unwrap();
    let statements = person.schema_statements();
    assert_eq!(statements.len(), 2);
    assert!(statements.iter().any(|s| s.contains("REQUIRE n.uid IS UNIQUE")));
    assert!(statements.iter().any(|s| s.contains("CREATE INDEX index_Person_name")));
}

// ============================================================================
// 7. Definition-time option conflicts
// ============================================================================

#[test]
fn test_definition_time_conflicts() {
    assert!(
        EntityClass::node("Person")
            .property("name", StringProperty::new().required(true).default("x"))
            .build()
            .is_err()
    );
    assert!(
        EntityClass::node("Person")
            .property("name", StringProperty::new().index(true).unique_index(true))
            .build()
            .is_err()
    );
}
