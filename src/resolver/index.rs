//! Entity index: workspace-relative file -> that file's entities
//!
//! Files keep the order in which they were first registered and each file's
//! entities keep extraction order, so every scan over the index is
//! deterministic. Within one file entities are unique by `raw_name`; a later
//! entity with the same `raw_name` replaces the earlier one in place.

use ahash::AHashMap;

use crate::schema::Entity;

#[derive(Debug, Default, Clone)]
pub struct EntityIndex {
    files: Vec<FileEntities>,
    positions: AHashMap<String, usize>,
}

#[derive(Debug, Clone)]
struct FileEntities {
    path: String,
    entities: Vec<Entity>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a flat entity list
    pub fn from_entities<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        let mut index = Self::new();
        for entity in entities {
            index.insert(entity.clone());
        }
        index
    }

    pub fn insert(&mut self, entity: Entity) {
        let position = match self.positions.get(&entity.file) {
            Some(&position) => position,
            None => {
                self.files.push(FileEntities {
                    path: entity.file.clone(),
                    entities: Vec::new(),
                });
                let position = self.files.len() - 1;
                self.positions.insert(entity.file.clone(), position);
                position
            }
        };

        let entities = &mut self.files[position].entities;
        match entities.iter_mut().find(|e| e.raw_name == entity.raw_name) {
            Some(existing) => *existing = entity,
            None => entities.push(entity),
        }
    }

    /// Entities of one file, in extraction order
    pub fn file(&self, path: &str) -> Option<&[Entity]> {
        self.positions
            .get(path)
            .map(|&position| self.files[position].entities.as_slice())
    }

    /// Entities of every file at or under `prefix` (`""` is the whole
    /// workspace), in registration order
    pub fn under_prefix(&self, prefix: &str) -> Vec<Entity> {
        self.files
            .iter()
            .filter(|f| is_under(&f.path, prefix))
            .flat_map(|f| f.entities.iter().cloned())
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn entity_count(&self) -> usize {
        self.files.iter().map(|f| f.entities.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Whether `path` is `prefix` itself or lies below it
pub fn is_under(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
