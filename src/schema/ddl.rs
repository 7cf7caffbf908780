//! Constraint and index statement generation.
//!
//! Declared property options (`unique_index`, `index`, fulltext and
//! vector index definitions) translate into the DDL a deployment step
//! would run once per class. Statements are emitted sorted by property
//! name so the output is stable.

use super::{Declared, EntityClass, EntityKind, SchemaFilter};
use crate::properties::Property;

impl EntityClass {
    /// The `CREATE CONSTRAINT` / `CREATE INDEX` statements implied by
    /// this class's resolved schema.
    pub fn schema_statements(&self) -> Vec<String> {
        let label = self.name();
        let mut entries: Vec<(String, Property)> = self
            .defined_properties(SchemaFilter::properties())
            .into_iter()
            .filter_map(|(name, declared)| match declared {
                Declared::Property(p) => Some((name, p)),
                _ => None,
            })
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        // Nodes index by label, relationships by type.
        let (entity_pattern, var) = match self.kind() {
            EntityKind::Node => (format!("(n:{label})"), "n"),
            EntityKind::Relationship => (format!("()-[r:{label}]-()"), "r"),
        };

        let mut statements = Vec::new();
        for (_, property) in entries {
            let prop = property.db_property_name();
            let options = property.options();
            if options.unique_index {
                statements.push(format!(
                    "CREATE CONSTRAINT constraint_unique_{label}_{prop} IF NOT EXISTS \
                     FOR {entity_pattern} REQUIRE {var}.{prop} IS UNIQUE"
                ));
            } else if options.index {
                statements.push(format!(
                    "CREATE INDEX index_{label}_{prop} IF NOT EXISTS \
                     FOR {entity_pattern} ON ({var}.{prop})"
                ));
            }
            if let Some(fulltext) = &options.fulltext_index {
                statements.push(format!(
                    "CREATE FULLTEXT INDEX fulltext_index_{label}_{prop} IF NOT EXISTS \
                     FOR {entity_pattern} ON EACH [{var}.{prop}] \
                     OPTIONS {{indexConfig: {{`fulltext.analyzer`: '{}', \
                     `fulltext.eventually_consistent`: {}}}}}",
                    fulltext.analyzer, fulltext.eventually_consistent
                ));
            }
            if let Some(vector) = &options.vector_index {
                statements.push(format!(
                    "CREATE VECTOR INDEX vector_index_{label}_{prop} IF NOT EXISTS \
                     FOR {entity_pattern} ON {var}.{prop} \
                     OPTIONS {{indexConfig: {{`vector.dimensions`: {}, \
                     `vector.similarity_function`: '{}'}}}}",
                    vector.dimensions, vector.similarity_function
                ));
            }
        }
        statements
    }
}

#[cfg(test)]
mod tests {
    use crate::properties::{FulltextIndex, IntegerProperty, StringProperty, VectorIndex};
    use crate::schema::EntityClass;
    use crate::spatial::{Crs, PointProperty};
    use crate::properties::ArrayProperty;
    use crate::properties::FloatProperty;

    #[test]
    fn test_unique_and_plain_indexes() {
        let person = EntityClass::node("Person")
            .property("uid", StringProperty::new().unique_index(true))
            .property("age", IntegerProperty::new().index(true))
            .build()
            .unwrap();
        let statements = person.schema_statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("CREATE INDEX index_Person_age"));
        assert!(statements[0].contains("FOR (n:Person) ON (n.age)"));
        assert!(statements[1].contains("CREATE CONSTRAINT constraint_unique_Person_uid"));
        assert!(statements[1].contains("REQUIRE n.uid IS UNIQUE"));
    }

    #[test]
    fn test_relationship_indexes_use_type_pattern() {
        let knows = EntityClass::rel("KNOWS")
            .property("since", IntegerProperty::new().index(true))
            .build()
            .unwrap();
        let statements = knows.schema_statements();
        assert!(statements[0].contains("FOR ()-[r:KNOWS]-() ON (r.since)"));
    }

    #[test]
    fn test_fulltext_and_vector_options() {
        let doc = EntityClass::node("Document")
            .property(
                "body",
                StringProperty::new().fulltext_index(FulltextIndex::new().analyzer("english")),
            )
            .property(
                "embedding",
                ArrayProperty::of(FloatProperty::new())
                    .vector_index(VectorIndex::new().dimensions(384)),
            )
            .property("location", PointProperty::new(Crs::Wgs84))
            .build()
            .unwrap();
        let statements = doc.schema_statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("FULLTEXT INDEX fulltext_index_Document_body"));
        assert!(statements[0].contains("'english'"));
        assert!(statements[1].contains("VECTOR INDEX vector_index_Document_embedding"));
        assert!(statements[1].contains("`vector.dimensions`: 384"));
    }
}
