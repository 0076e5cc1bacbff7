//! Lookup mode: map an import target to the id of the entity it refers to
//!
//! Resolution order, first hit wins:
//!
//! 1. a directory target is replaced by its entry file
//! 2. the target file's own entities in the index
//! 3. an upward search from the target's directory to the workspace root
//! 4. extraction-mode classification (content, then naming rules)
//!
//! Steps 2-3 return ids that exist in the index; step 4 may synthesize one.

use std::path::Path;
use std::sync::Arc;

use super::caches::LookupKey;
use super::EntityResolver;
use crate::fs::{absolute_path, module_name, relative_path, resolve_entry_file};
use crate::lang::is_sfc_path;
use crate::schema::{Entity, ResolvedId};

/// Path depth, used to order candidates nearest-first
fn depth(path: &str) -> usize {
    path.matches('/').count()
}

impl EntityResolver {
    /// Id of the entity `name` (or the default export) of `file`
    ///
    /// Relative paths are taken relative to `root`. Never returns an empty
    /// id for a non-empty name.
    pub fn generate_id_by_lookup(&self, file: &Path, name: &str, is_default: bool, root: &Path) -> String {
        self.resolve_lookup(file, name, is_default, root).id
    }

    /// [`Self::generate_id_by_lookup`], also reporting whether the id came
    /// from the index
    pub fn resolve_lookup(&self, file: &Path, name: &str, is_default: bool, root: &Path) -> ResolvedId {
        // `import { default as X }` names the default export
        let is_default = is_default || name == "default";
        let relative = relative_path(root, file);
        let absolute = absolute_path(root, file);

        // A directory stands for its entry file; siblings of the directory
        // must not be searched before it
        let mut concrete = absolute.clone();
        let mut search_from = relative.clone();
        if self.fs().is_dir(&absolute) {
            if let Some(entry) = resolve_entry_file(self.fs(), &absolute, &self.config.entry_files) {
                search_from = relative_path(root, &entry);
                concrete = entry;
            }
        }

        if let Some(id) = self.lookup_indexed(&search_from, name, is_default) {
            if search_from != relative {
                tracing::debug!("[RESOLVE] {} -> {} via entry {}", relative, id, search_from);
            }
            return ResolvedId::indexed(&id);
        }

        self.caches.record_fallback();
        let resolved = self.generate_id(&concrete, name, is_default, None, None);
        tracing::debug!("[RESOLVE] {}:{} not indexed, inferred {}", relative, name, resolved.id);
        resolved
    }

    /// Own-file match, then upward search
    fn lookup_indexed(&self, relative: &str, name: &str, is_default: bool) -> Option<String> {
        self.match_own_file(relative, name, is_default)
            .or_else(|| self.search_parent_paths(relative, name, is_default))
    }

    /// Match against the entities registered for `relative` itself
    fn match_own_file(&self, relative: &str, name: &str, is_default: bool) -> Option<String> {
        let index = self.index.read();
        let entities = index.file(relative)?;

        // A single-file component is one entity
        if is_sfc_path(relative) {
            return entities.first().map(|e| e.id.clone());
        }

        let found = if is_default {
            let base = module_name(relative, &self.config.entry_files);
            let suffix = format!(":{}", base);
            entities
                .iter()
                .find(|e| e.raw_name == "default")
                .or_else(|| entities.iter().find(|e| e.raw_name == base))
                .or_else(|| entities.iter().find(|e| e.id.ends_with(&suffix)))
                .or_else(|| entities.iter().find(|e| e.default_export))
        } else {
            entities.iter().find(|e| e.raw_name == name)
        };

        found.map(|e| e.id.clone())
    }

    /// Search the directories above `relative`, nearest first
    ///
    /// The outcome (including "not found") is memoized per
    /// `(relative, name, is_default)` and candidates are memoized per
    /// directory prefix; neither is refreshed by re-indexing.
    fn search_parent_paths(&self, relative: &str, name: &str, is_default: bool) -> Option<String> {
        let key = LookupKey::new(relative, name, is_default);
        if let Some(cached) = self.caches.final_result(&key) {
            return cached;
        }

        let requested_base = module_name(relative, &self.config.entry_files);
        let parts: Vec<&str> = relative.split('/').filter(|p| !p.is_empty()).collect();

        let mut result = None;
        for level in (0..parts.len()).rev() {
            let prefix = parts[..level].join("/");
            let candidates = self.candidates_under(&prefix);
            if candidates.is_empty() {
                continue;
            }
            if let Some(entity) =
                self.find_matching_entity(&candidates, name, is_default, &requested_base)
            {
                tracing::trace!(
                    "[RESOLVE] {}:{} matched {} under '{}'",
                    relative,
                    name,
                    entity.id,
                    prefix
                );
                result = Some(entity.id.clone());
                break;
            }
        }

        self.caches.store_final_result(key, result.clone());
        result
    }

    /// Entities at or under `prefix`, shallowest files first
    fn candidates_under(&self, prefix: &str) -> Arc<[Entity]> {
        self.caches.candidates(prefix, || {
            let mut entities = self.index.read().under_prefix(prefix);
            entities.sort_by_key(|e| depth(&e.file));
            entities
        })
    }

    /// Pick the entity an import refers to among one level's candidates
    ///
    /// Each strategy scans every candidate before the next one runs.
    fn find_matching_entity<'a>(
        &self,
        candidates: &'a [Entity],
        name: &str,
        is_default: bool,
        requested_base: &str,
    ) -> Option<&'a Entity> {
        let by_raw_name = candidates.iter().find(|e| e.raw_name == name);
        if by_raw_name.is_some() {
            return by_raw_name;
        }

        let named_suffix = format!(":{}", name);
        let entry_files = &self.config.entry_files;

        if is_default {
            // A bare default export anywhere on this level beats name heuristics
            candidates
                .iter()
                .find(|e| e.raw_name == "default")
                .or_else(|| candidates.iter().find(|e| e.id.contains(&named_suffix)))
                .or_else(|| {
                    candidates
                        .iter()
                        .find(|e| module_name(&e.file, entry_files) == name)
                })
                .or_else(|| {
                    let same_base = |e: &&Entity| module_name(&e.file, entry_files) == requested_base;
                    candidates
                        .iter()
                        .filter(same_base)
                        .find(|e| e.default_export)
                        .or_else(|| candidates.iter().find(same_base))
                })
        } else {
            candidates
                .iter()
                .find(|e| e.id_name() == name)
                .or_else(|| candidates.iter().find(|e| e.id.contains(&named_suffix)))
        }
    }
}
