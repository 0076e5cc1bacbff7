//! Downstream-facing facade
//!
//! [`EntityEngine`] wires one source cache and one resolver together and
//! exposes the operations a workspace analyzer needs:
//!
//! 1. `extract` every file and collect the entities
//! 2. `init_entity_map` with the full list
//! 3. `generate_id_by_lookup` for every import site
//!
//! None of these fail: unreadable files yield no entities and lookups always
//! produce an id.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::detectors::{extractor_for, ExtractContext, ExtractorKind};
use crate::detectors::declaration::Declaration;
use crate::fs::{absolute_path, relative_path, FileSystem, OsFileSystem};
use crate::lang::Lang;
use crate::resolver::{EntityResolver, ResolverStats};
use crate::schema::{Entity, ResolvedId};
use crate::source_cache::{SourceCache, SourceCacheStats};

pub struct EntityEngine {
    config: EngineConfig,
    source_cache: Arc<SourceCache>,
    resolver: EntityResolver,
}

impl EntityEngine {
    /// Engine over the real filesystem
    pub fn new(config: EngineConfig) -> Self {
        Self::with_file_system(config, Arc::new(OsFileSystem))
    }

    pub fn with_file_system(config: EngineConfig, fs: Arc<dyn FileSystem>) -> Self {
        let source_cache = Arc::new(SourceCache::new(fs, config.cache.clone()));
        let resolver = EntityResolver::new(source_cache.clone(), config.resolve.clone());
        Self {
            config,
            source_cache,
            resolver,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source_cache(&self) -> &SourceCache {
        &self.source_cache
    }

    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    /// Entities of one file, in source order
    ///
    /// `file` may be absolute or relative to `root`; entity paths are always
    /// relative to `root`. Repeated calls on an unchanged file are served
    /// from the extraction cache.
    pub fn extract(&self, file: &Path, root: &Path) -> Vec<Entity> {
        let absolute = absolute_path(root, file);
        let lang = match Lang::from_path(&absolute) {
            Ok(lang) => lang,
            Err(e) => {
                tracing::warn!("[EXTRACT] Skipping {}: {}", absolute.display(), e);
                return Vec::new();
            }
        };

        let extractor = extractor_for(lang);
        if let Some(cached) = self.source_cache.get_extraction(extractor.kind(), &absolute) {
            tracing::debug!("[EXTRACT] Cache hit {}", absolute.display());
            return cached.as_ref().clone();
        }

        let start = Instant::now();
        let Some(parsed) = self.source_cache.get_parsed_tree(&absolute, None) else {
            return Vec::new();
        };

        let rel_path = relative_path(root, &absolute);
        let ctx = ExtractContext {
            rel_path: &rel_path,
            resolve: &self.config.resolve,
        };
        let entities = extractor.extract(&parsed, &ctx);

        tracing::debug!(
            "[EXTRACT] {} extracted {} entities in {:?}",
            rel_path,
            entities.len(),
            start.elapsed()
        );
        self.source_cache
            .set_extraction(extractor.kind(), &absolute, entities.clone());
        entities
    }

    /// Entities of many files, concatenated in the given order
    pub fn extract_all<P: AsRef<Path>>(&self, files: &[P], root: &Path) -> Vec<Entity> {
        files
            .iter()
            .flat_map(|file| self.extract(file.as_ref(), root))
            .collect()
    }

    /// Replace the entity index used by lookups
    pub fn init_entity_map(&self, entities: &[Entity]) {
        self.resolver.init_entity_map(entities);
    }

    /// Extraction-mode id for `name` in `file`
    pub fn generate_id(
        &self,
        file: &Path,
        name: &str,
        is_default: bool,
        decl: Option<&Declaration>,
        markup: Option<bool>,
    ) -> String {
        self.resolver
            .generate_id(file, name, is_default, decl, markup)
            .id
    }

    /// Lookup-mode id for an import of `name` (or the default export) from
    /// `file`
    pub fn generate_id_by_lookup(&self, file: &Path, name: &str, is_default: bool, root: &Path) -> String {
        self.resolver
            .generate_id_by_lookup(file, name, is_default, root)
    }

    pub fn resolve_lookup(&self, file: &Path, name: &str, is_default: bool, root: &Path) -> ResolvedId {
        self.resolver.resolve_lookup(file, name, is_default, root)
    }

    /// Drop the resolver's memo tables (index and parsed trees are kept)
    pub fn clear_cache(&self) {
        self.resolver.clear_cache();
    }

    /// Drop the resolver's memo tables and every parsed tree and extraction
    pub fn clear_all(&self) {
        self.resolver.clear_cache();
        self.source_cache.clear_all();
    }

    /// Drop one extractor's cached results; returns how many were dropped
    pub fn clear_extractor_cache(&self, kind: ExtractorKind) -> usize {
        self.source_cache.clear_extractor_cache(kind)
    }

    /// Forget everything cached for one file
    pub fn invalidate_file(&self, file: &Path, root: &Path) {
        self.source_cache.clear_file(&absolute_path(root, file));
    }

    /// Files and entities in the current index
    pub fn index_size(&self) -> (usize, usize) {
        self.resolver.index_size()
    }

    pub fn resolver_stats(&self) -> ResolverStats {
        self.resolver.stats()
    }

    pub fn cache_stats(&self) -> SourceCacheStats {
        self.source_cache.stats()
    }
}
