//! Custom assertions for entity lists

use std::collections::HashSet;

use entity_resolver::Entity;

/// Assert that an entity with the given id exists and return it
pub fn assert_entity<'a>(entities: &'a [Entity], id: &str) -> &'a Entity {
    entities.iter().find(|e| e.id == id).unwrap_or_else(|| {
        panic!(
            "Expected entity '{}' in:\n{}",
            id,
            serde_json::to_string_pretty(entities).unwrap()
        )
    })
}

/// Assert that no entity with the given id exists
pub fn assert_no_entity(entities: &[Entity], id: &str) {
    assert!(
        !entities.iter().any(|e| e.id == id),
        "Expected NOT to find entity '{}'",
        id
    );
}

/// Assert that `(file, id)` pairs are unique
pub fn assert_unique_per_file(entities: &[Entity]) {
    let mut seen = HashSet::new();
    for entity in entities {
        assert!(
            seen.insert((entity.file.clone(), entity.id.clone(), entity.raw_name.clone())),
            "Duplicate entity {} in {}",
            entity.id,
            entity.file
        );
    }
}

/// Ids of all entities, in order
pub fn ids(entities: &[Entity]) -> Vec<&str> {
    entities.iter().map(|e| e.id.as_str()).collect()
}
