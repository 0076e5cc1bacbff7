//! Memo tables owned by the resolver
//!
//! - **File-type cache**: `(file, name, is_default)` -> kind and minted name
//!   from content classification
//! - **Candidate cache**: directory prefix -> entities at or under it
//! - **Final-result cache**: `(relative path, name, is_default)` -> outcome of
//!   the upward search, including "no match"
//!
//! None of these is invalidated by re-indexing; hosts call
//! [`ResolverCaches::clear_lookups`] or [`ResolverCaches::clear_all`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::schema::{Entity, EntityKind};

/// Key shared by the file-type and final-result caches
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    pub path: String,
    pub name: String,
    pub is_default: bool,
}

impl LookupKey {
    pub fn new(path: impl Into<String>, name: &str, is_default: bool) -> Self {
        Self {
            path: path.into(),
            name: name.to_string(),
            is_default,
        }
    }
}

/// A content classification result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: EntityKind,
    /// Name the id is minted under
    pub name: String,
}

/// Snapshot of the resolver counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Times candidates were gathered from the index for a prefix
    pub candidate_gathers: usize,
    pub candidate_cache_hits: usize,
    pub final_result_hits: usize,
    pub file_type_hits: usize,
    /// Lookups that ended in content or naming classification
    pub fallbacks: usize,
}

#[derive(Debug, Default)]
struct Counters {
    candidate_gathers: AtomicUsize,
    candidate_cache_hits: AtomicUsize,
    final_result_hits: AtomicUsize,
    file_type_hits: AtomicUsize,
    fallbacks: AtomicUsize,
}

#[derive(Debug, Default)]
pub struct ResolverCaches {
    file_types: RwLock<AHashMap<LookupKey, Classified>>,
    candidates: RwLock<AHashMap<String, Arc<[Entity]>>>,
    final_results: RwLock<AHashMap<LookupKey, Option<String>>>,
    counters: Counters,
}

impl ResolverCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_type(&self, key: &LookupKey) -> Option<Classified> {
        let hit = self.file_types.read().get(key).cloned();
        if hit.is_some() {
            self.counters.file_type_hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub fn store_file_type(&self, key: LookupKey, classified: Classified) {
        self.file_types.write().insert(key, classified);
    }

    /// Candidates for `prefix`, gathering them with `gather` on a miss
    pub fn candidates(&self, prefix: &str, gather: impl FnOnce() -> Vec<Entity>) -> Arc<[Entity]> {
        if let Some(hit) = self.candidates.read().get(prefix) {
            self.counters
                .candidate_cache_hits
                .fetch_add(1, Ordering::Relaxed);
            return hit.clone();
        }

        let gathered: Arc<[Entity]> = gather().into();
        self.counters.candidate_gathers.fetch_add(1, Ordering::Relaxed);
        self.candidates
            .write()
            .insert(prefix.to_string(), gathered.clone());
        gathered
    }

    /// Memoized upward-search outcome; the outer `Option` is the cache miss
    pub fn final_result(&self, key: &LookupKey) -> Option<Option<String>> {
        let hit = self.final_results.read().get(key).cloned();
        if hit.is_some() {
            self.counters.final_result_hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub fn store_final_result(&self, key: LookupKey, id: Option<String>) {
        self.final_results.write().insert(key, id);
    }

    pub fn record_fallback(&self) {
        self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop the candidate and final-result caches
    pub fn clear_lookups(&self) {
        self.candidates.write().clear();
        self.final_results.write().clear();
    }

    /// Drop every memo table
    pub fn clear_all(&self) {
        self.clear_lookups();
        self.file_types.write().clear();
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            candidate_gathers: self.counters.candidate_gathers.load(Ordering::Relaxed),
            candidate_cache_hits: self.counters.candidate_cache_hits.load(Ordering::Relaxed),
            final_result_hits: self.counters.final_result_hits.load(Ordering::Relaxed),
            file_type_hits: self.counters.file_type_hits.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
        }
    }
}
