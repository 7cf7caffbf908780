//! End-to-end tests for relationship entities over `LocalGraph`.

use std::sync::Arc;

use neomodel_rs::{
    ClassRegistry, EntityClass, IntegerProperty, LocalGraph, PropertyMap, StringProperty,
    StructuredRel, Value, props,
};

fn setup() -> (Arc<ClassRegistry>, LocalGraph, EntityClass, EntityClass) {
    let registry = Arc::new(ClassRegistry::new());
    let person = EntityClass::node("Person")
        .property("name", StringProperty::new().required(true))
        .build()
        .unwrap();
    let knows = EntityClass::rel("KNOWS")
        .property("since", IntegerProperty::new())
        .build()
        .unwrap();
    registry.register_node(&person).unwrap();
    registry.register_rel(&knows).unwrap();
    let graph = LocalGraph::new(registry.clone());
    (registry, graph, person, knows)
}

// ============================================================================
// 1. Inflate a raw edge, then resolve each endpoint with one lookup
// ============================================================================

#[tokio::test]
async fn test_endpoint_resolution_is_one_lookup_each() {
    let (_registry, graph, _person, knows) = setup();

    let ada = graph.seed_node(&["Person"], props([("name", Value::from("Ada"))]));
    let bob = graph.seed_node(&["Person"], props([("name", Value::from("Bob"))]));
    let raw = graph.seed_relationship(
        "KNOWS",
        ada.id,
        bob.id,
        props([("since", Value::Int(1815))]),
    );

    let rel = StructuredRel::inflate(&knows, &raw).unwrap();
    assert_eq!(rel.get("since"), Some(&Value::Int(1815)));
    assert_eq!(rel.start_node_element_id(), Some(ada.id.to_string().as_str()));
    assert_eq!(rel.end_node_element_id(), Some(bob.id.to_string().as_str()));

    assert_eq!(graph.executed_statements(), 0);
    let start = rel.start_node(&graph).await.unwrap();
    assert_eq!(graph.executed_statements(), 1);
    let end = rel.end_node(&graph).await.unwrap();
    assert_eq!(graph.executed_statements(), 2);

    // The collaborator resolved each row to the registered class.
    assert_eq!(start.class().name(), "Person");
    assert_eq!(start.get("name"), Some(&Value::from("Ada")));
    assert_eq!(end.get("name"), Some(&Value::from("Bob")));
}

// ============================================================================
// 2. Save is exactly one round trip
// ============================================================================

#[tokio::test]
async fn test_save_updates_the_edge_in_one_round_trip() {
    let (_registry, graph, _person, knows) = setup();

    let ada = graph.seed_node(&["Person"], props([("name", Value::from("Ada"))]));
    let bob = graph.seed_node(&["Person"], props([("name", Value::from("Bob"))]));
    let raw = graph.seed_relationship("KNOWS", ada.id, bob.id, PropertyMap::new());

    let mut rel = StructuredRel::inflate(&knows, &raw).unwrap();
    rel.set("since", Value::Int(1833));

    let before = graph.executed_statements();
    rel.save(&graph).await.unwrap();
    assert_eq!(graph.executed_statements(), before + 1);

    let stored = graph.relationship(raw.id).unwrap();
    assert_eq!(stored.properties.get("since"), Some(&Value::Int(1833)));
}

// ============================================================================
// 3. Legacy identifier views and the migration error
// ============================================================================

#[tokio::test]
async fn test_legacy_ids_work_against_numeric_element_ids() {
    let (_registry, graph, _person, knows) = setup();
    let ada = graph.seed_node(&["Person"], props([("name", Value::from("Ada"))]));
    let bob = graph.seed_node(&["Person"], props([("name", Value::from("Bob"))]));
    let raw = graph.seed_relationship("KNOWS", ada.id, bob.id, PropertyMap::new());

    let rel = StructuredRel::inflate(&knows, &raw).unwrap();
    assert_eq!(rel.id().unwrap(), raw.id.0 as i64);
    assert_eq!(rel.start_node_id().unwrap(), ada.id.0 as i64);
    assert_eq!(rel.end_node_id().unwrap(), bob.id.0 as i64);
}

#[test]
fn test_legacy_ids_fail_against_string_element_ids() {
    let (_registry, _graph, _person, knows) = setup();
    let raw = neomodel_rs::Relationship::new(
        neomodel_rs::RelId(1),
        neomodel_rs::NodeId(1),
        neomodel_rs::NodeId(2),
        "KNOWS",
    )
    .with_element_ids("5:abc:1", "4:abc:1", "4:abc:2");
    let rel = StructuredRel::inflate(&knows, &raw).unwrap();
    let err = rel.id().unwrap_err();
    assert!(err.to_string().contains("migrate to element_id"));
}

// ============================================================================
// 4. Unregistered relationship types fall back to a bare class
// ============================================================================

#[tokio::test]
async fn test_unregistered_rel_type_resolves_as_bare_relationship() {
    let (_registry, graph, _person, knows) = setup();
    let ada = graph.seed_node(&["Person"], props([("name", Value::from("Ada"))]));
    let bob = graph.seed_node(&["Person"], props([("name", Value::from("Bob"))]));
    // LIKES has no registered class.
    let liked = graph.seed_relationship("LIKES", ada.id, bob.id, PropertyMap::new());
    let raw_knows = graph.seed_relationship("KNOWS", ada.id, bob.id, PropertyMap::new());

    let registry = graph.registry();
    assert!(registry.rel_class(&liked).is_none());
    assert_eq!(registry.rel_class(&raw_knows).unwrap().name(), knows.name());
}
