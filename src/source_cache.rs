//! Source cache: parsed trees and extraction results, keyed by file path
//!
//! Two layers live here:
//!
//! 1. **Parsed files** - one tree-sitter tree per file. A file is re-parsed
//!    only when no content is supplied and its on-disk modification time
//!    changed, or when the supplied content differs from the cached content.
//!    Re-parses reuse the previous tree incrementally (tree-sitter
//!    `InputEdit`), which is far cheaper than a full parse for small edits.
//! 2. **Extraction results** - entity lists per `(extractor, file)`. A lookup
//!    returns `None` both for absent and for stale entries; staleness is
//!    detected from the file's modification time. When the estimated
//!    footprint crosses `cleanup_threshold * max_bytes`, the oldest half of
//!    the entries (by insertion order) is evicted.
//!
//! Both layers use interior locking so hosts that run extractors on several
//! threads can share one cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use tree_sitter::{InputEdit, Parser, Point, Tree};

use crate::config::CacheConfig;
use crate::detectors::vue::extract_sfc_script;
use crate::detectors::ExtractorKind;
use crate::error::{EntityError, Result};
use crate::fs::FileSystem;
use crate::lang::Lang;
use crate::schema::Entity;

/// Script block facts for a `.vue` file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SfcInfo {
    /// Whether the file has any `<script>` block
    pub has_script: bool,
    /// Whether the script is a `<script setup>` block
    pub is_setup: bool,
    /// Lines to add to tree rows to get file lines
    pub line_offset: usize,
    /// Last file line of the script block
    pub end_line: usize,
}

/// A parsed file as handed out by the cache
#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub path: PathBuf,
    /// Language of the file itself
    pub lang: Lang,
    /// Grammar the tree was parsed with (differs from `lang` for `.vue`)
    pub script_lang: Lang,
    /// Full file content
    pub content: Arc<str>,
    /// Text the tree was parsed from (the script block for `.vue`)
    pub source: Arc<str>,
    pub tree: Tree,
    pub sfc: Option<SfcInfo>,
}

impl ParsedSource {
    /// Offset to add to 1-based tree lines to get file lines
    pub fn line_offset(&self) -> usize {
        self.sfc.map(|s| s.line_offset).unwrap_or(0)
    }
}

#[derive(Debug)]
struct CachedFile {
    parsed: ParsedSource,
    mtime: Option<SystemTime>,
}

#[derive(Debug)]
struct ExtractionEntry {
    entities: Arc<Vec<Entity>>,
    mtime: Option<SystemTime>,
    seq: u64,
}

#[derive(Debug, Default)]
struct ExtractionStore {
    entries: AHashMap<(ExtractorKind, PathBuf), ExtractionEntry>,
    next_seq: u64,
}

/// Statistics about the source cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceCacheStats {
    /// Number of parsed files in cache
    pub parsed_files: usize,
    /// Number of `(extractor, file)` extraction entries
    pub extraction_entries: usize,
    /// Estimated footprint used for the cleanup decision
    pub estimated_bytes: u64,
}

/// How `get_parsed_tree` satisfied a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Returned the cached tree unchanged
    Cached,
    /// No usable previous tree; parsed from scratch
    Full,
    /// Re-parsed reusing the previous tree
    Incremental,
}

/// Parsed-file and extraction-result cache
pub struct SourceCache {
    fs: Arc<dyn FileSystem>,
    config: CacheConfig,
    files: RwLock<AHashMap<PathBuf, CachedFile>>,
    extractions: RwLock<ExtractionStore>,
    /// Parser instance (reused across parses)
    parser: Mutex<Parser>,
}

impl SourceCache {
    pub fn new(fs: Arc<dyn FileSystem>, config: CacheConfig) -> Self {
        Self {
            fs,
            config,
            files: RwLock::new(AHashMap::new()),
            extractions: RwLock::new(ExtractionStore::default()),
            parser: Mutex::new(Parser::new()),
        }
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    // ------------------------------------------------------------------------
    // Parsed files
    // ------------------------------------------------------------------------

    /// Get the parsed tree for `path`, parsing or re-parsing as needed
    ///
    /// Returns `None` only for unreadable, unsupported or unparseable input;
    /// the reason is logged.
    pub fn get_parsed_tree(&self, path: &Path, content: Option<&str>) -> Option<ParsedSource> {
        match self.parse_file(path, content) {
            Ok((parsed, outcome)) => {
                tracing::trace!("[CACHE] {:?} {}", outcome, path.display());
                Some(parsed)
            }
            Err(e) if e.is_missing_file() => {
                tracing::debug!("[CACHE] {}", e);
                None
            }
            Err(e) => {
                tracing::warn!("[CACHE] Cannot parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Parse a file, reporting how the cache satisfied the request
    pub fn parse_file(
        &self,
        path: &Path,
        content: Option<&str>,
    ) -> Result<(ParsedSource, ParseOutcome)> {
        let lang = Lang::from_path(path)?;

        let disk_mtime = self.fs.modified(path).ok();
        if let Some(cached) = self.files.read().get(path) {
            let fresh = match content {
                Some(text) => *cached.parsed.content == *text,
                None => cached.mtime.is_some() && cached.mtime == disk_mtime,
            };
            if fresh {
                return Ok((cached.parsed.clone(), ParseOutcome::Cached));
            }
        }

        let text: Arc<str> = match content {
            Some(text) => Arc::from(text),
            None => {
                if !self.fs.is_file(path) {
                    return Err(EntityError::FileNotFound {
                        path: path.to_path_buf(),
                    });
                }
                Arc::from(self.fs.read_to_string(path)?)
            }
        };

        let (script_lang, source, sfc) = if lang.is_single_file_component() {
            match extract_sfc_script(&text) {
                Some(script) => {
                    let line_offset = script.start_line.saturating_sub(1);
                    let end_line = line_offset + script.content.lines().count().max(1);
                    (
                        script.lang,
                        Arc::from(script.content),
                        Some(SfcInfo {
                            has_script: true,
                            is_setup: script.is_setup,
                            line_offset,
                            end_line,
                        }),
                    )
                }
                None => (
                    Lang::JavaScript,
                    Arc::from(""),
                    Some(SfcInfo {
                        has_script: false,
                        is_setup: false,
                        line_offset: 0,
                        end_line: 0,
                    }),
                ),
            }
        } else {
            (lang, text.clone(), None)
        };

        // Hold the write lock across the parse so concurrent callers do not
        // parse the same file twice
        let mut files = self.files.write();
        let previous = files
            .get(path)
            .filter(|cached| cached.parsed.script_lang == script_lang)
            .map(|cached| (cached.parsed.source.clone(), cached.parsed.tree.clone()));

        let (tree, outcome) = self.parse_source(&source, script_lang, previous)?;
        if tree.root_node().has_error() {
            tracing::debug!("[CACHE] {} parsed with syntax errors", path.display());
        }

        let parsed = ParsedSource {
            path: path.to_path_buf(),
            lang,
            script_lang,
            content: text,
            source,
            tree,
            sfc,
        };
        files.insert(
            path.to_path_buf(),
            CachedFile {
                parsed: parsed.clone(),
                mtime: disk_mtime,
            },
        );

        Ok((parsed, outcome))
    }

    fn parse_source(
        &self,
        source: &str,
        lang: Lang,
        previous: Option<(Arc<str>, Tree)>,
    ) -> Result<(Tree, ParseOutcome)> {
        let mut parser = self.parser.lock();
        parser
            .set_language(&lang.tree_sitter_language())
            .map_err(|e| EntityError::ParseFailure {
                message: format!("Failed to set language {}: {}", lang.name(), e),
            })?;

        if let Some((old_source, mut old_tree)) = previous {
            let edit = compute_edit(&old_source, source);
            old_tree.edit(&edit);
            let tree = parser
                .parse(source, Some(&old_tree))
                .ok_or_else(|| EntityError::ParseFailure {
                    message: "Incremental parse failed".to_string(),
                })?;
            return Ok((tree, ParseOutcome::Incremental));
        }

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| EntityError::ParseFailure {
                message: "Full parse failed".to_string(),
            })?;
        Ok((tree, ParseOutcome::Full))
    }

    /// Whether a parsed tree is cached for `path`
    pub fn contains(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    // ------------------------------------------------------------------------
    // Extraction results
    // ------------------------------------------------------------------------

    /// Cached extraction result, or `None` if absent or stale
    pub fn get_extraction(&self, kind: ExtractorKind, path: &Path) -> Option<Arc<Vec<Entity>>> {
        if !self.config.enabled {
            return None;
        }

        let key = (kind, path.to_path_buf());
        let cached_mtime = self.extractions.read().entries.get(&key).map(|e| e.mtime)?;

        let current = self.fs.modified(path).ok();
        if current.is_none() || current != cached_mtime {
            tracing::debug!(
                "[CACHE] Stale {} extraction for {}",
                kind.name(),
                path.display()
            );
            self.extractions.write().entries.remove(&key);
            return None;
        }

        self.extractions
            .read()
            .entries
            .get(&key)
            .map(|e| e.entities.clone())
    }

    /// Store an extraction result, evicting the oldest half first when the
    /// estimated footprint is over the cleanup threshold
    pub fn set_extraction(&self, kind: ExtractorKind, path: &Path, entities: Vec<Entity>) {
        if !self.config.enabled {
            return;
        }

        if self.estimated_bytes() > self.config.cleanup_trigger_bytes() {
            self.evict_oldest_half();
        }

        // Record the mtime the entities were derived from, so an edit made
        // after parsing still reads as stale
        let mtime = self
            .files
            .read()
            .get(path)
            .and_then(|cached| cached.mtime)
            .or_else(|| self.fs.modified(path).ok());

        let mut store = self.extractions.write();
        let seq = store.next_seq;
        store.next_seq += 1;
        store.entries.insert(
            (kind, path.to_path_buf()),
            ExtractionEntry {
                entities: Arc::new(entities),
                mtime,
                seq,
            },
        );
    }

    fn evict_oldest_half(&self) {
        let mut store = self.extractions.write();
        let mut order: Vec<((ExtractorKind, PathBuf), u64)> = store
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.seq))
            .collect();
        order.sort_by_key(|(_, seq)| *seq);

        let evict = order.len() / 2;
        for (key, _) in order.into_iter().take(evict) {
            store.entries.remove(&key);
        }

        tracing::info!(
            "[CACHE] Cleanup evicted {} extraction entries, {} remain",
            evict,
            store.entries.len()
        );
    }

    /// Estimated footprint: fixed cost per parsed file plus per cached entity
    pub fn estimated_bytes(&self) -> u64 {
        let parsed = self.files.read().len() as u64 * self.config.parsed_file_bytes;
        let entities: u64 = self
            .extractions
            .read()
            .entries
            .values()
            .map(|e| e.entities.len() as u64)
            .sum();
        parsed + entities * self.config.entity_bytes
    }

    // ------------------------------------------------------------------------
    // Invalidation
    // ------------------------------------------------------------------------

    /// Drop every parsed tree and extraction result
    pub fn clear_all(&self) {
        self.files.write().clear();
        self.extractions.write().entries.clear();
        tracing::info!("[CACHE] Cleared all source and extraction caches");
    }

    /// Drop all extraction results of one extractor; returns how many
    pub fn clear_extractor_cache(&self, kind: ExtractorKind) -> usize {
        let mut store = self.extractions.write();
        let before = store.entries.len();
        store.entries.retain(|(k, _), _| *k != kind);
        let removed = before - store.entries.len();
        tracing::info!("[CACHE] Cleared {} {} extraction entries", removed, kind.name());
        removed
    }

    /// Drop one file's parsed tree and all its extraction results
    pub fn clear_file(&self, path: &Path) {
        self.files.write().remove(path);
        self.extractions
            .write()
            .entries
            .retain(|(_, p), _| p.as_path() != path);
        tracing::debug!("[CACHE] Cleared caches for {}", path.display());
    }

    pub fn stats(&self) -> SourceCacheStats {
        SourceCacheStats {
            parsed_files: self.files.read().len(),
            extraction_entries: self.extractions.read().entries.len(),
            estimated_bytes: self.estimated_bytes(),
        }
    }
}

/// Compute the InputEdit for tree-sitter given old and new source
///
/// Finds the first and last differing bytes and produces a single edit
/// spanning them. Multiple distant changes collapse into one wide edit,
/// which is less optimal but still correct.
pub fn compute_edit(old_source: &str, new_source: &str) -> InputEdit {
    let old_bytes = old_source.as_bytes();
    let new_bytes = new_source.as_bytes();

    let start_byte = old_bytes
        .iter()
        .zip(new_bytes.iter())
        .position(|(a, b)| a != b)
        .unwrap_or(old_bytes.len().min(new_bytes.len()));

    let common_suffix = old_bytes[start_byte..]
        .iter()
        .rev()
        .zip(new_bytes[start_byte..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_end_byte = old_bytes.len() - common_suffix;
    let new_end_byte = new_bytes.len() - common_suffix;

    InputEdit {
        start_byte,
        old_end_byte,
        new_end_byte,
        start_position: byte_to_point(old_source, start_byte),
        old_end_position: byte_to_point(old_source, old_end_byte),
        new_end_position: byte_to_point(new_source, new_end_byte),
    }
}

/// Convert a byte offset to a tree-sitter Point (row, byte column)
fn byte_to_point(source: &str, byte_offset: usize) -> Point {
    let prefix = &source.as_bytes()[..byte_offset.min(source.len())];
    let row = prefix.iter().filter(|&&b| b == b'\n').count();
    let column = match prefix.iter().rposition(|&b| b == b'\n') {
        Some(newline) => prefix.len() - newline - 1,
        None => prefix.len(),
    };
    Point { row, column }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::schema::{EntityKind, LineSpan};

    fn cache_with(fs: Arc<MemoryFileSystem>, config: CacheConfig) -> SourceCache {
        SourceCache::new(fs, config)
    }

    fn entity(name: &str) -> Entity {
        Entity {
            id: EntityKind::Function.id_for(name),
            kind: EntityKind::Function,
            file: format!("src/{}.ts", name),
            loc: LineSpan::new(1, 1),
            raw_name: name.to_string(),
            default_export: false,
            code_hash: String::new(),
        }
    }

    #[test]
    fn test_compute_edit_insert() {
        let edit = compute_edit("function foo() {}", "function foobar() {}");
        assert_eq!(edit.start_byte, 12);
        assert_eq!(edit.old_end_byte, 12);
        assert_eq!(edit.new_end_byte, 15);
    }

    #[test]
    fn test_compute_edit_replace() {
        let edit = compute_edit("let x = 1;", "let x = 42;");
        assert_eq!(edit.start_byte, 8);
        assert_eq!(edit.old_end_byte, 9);
        assert_eq!(edit.new_end_byte, 10);
    }

    #[test]
    fn test_byte_to_point() {
        let source = "line1\nline2\nline3";
        assert_eq!(byte_to_point(source, 0), Point { row: 0, column: 0 });
        assert_eq!(byte_to_point(source, 3), Point { row: 0, column: 3 });
        assert_eq!(byte_to_point(source, 6), Point { row: 1, column: 0 });
        assert_eq!(byte_to_point(source, 14), Point { row: 2, column: 2 });
    }

    #[test]
    fn test_parse_is_cached_until_mtime_changes() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write("/repo/a.ts", "export function a() {}");
        let cache = cache_with(fs.clone(), CacheConfig::default());
        let path = Path::new("/repo/a.ts");

        let (_, first) = cache.parse_file(path, None).unwrap();
        assert_eq!(first, ParseOutcome::Full);
        let (_, second) = cache.parse_file(path, None).unwrap();
        assert_eq!(second, ParseOutcome::Cached);

        fs.write("/repo/a.ts", "export function ab() {}");
        let (parsed, third) = cache.parse_file(path, None).unwrap();
        assert_eq!(third, ParseOutcome::Incremental);
        assert_eq!(&*parsed.source, "export function ab() {}");
    }

    #[test]
    fn test_supplied_content_compared_with_cache() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write("/repo/a.ts", "const a = 1;");
        let cache = cache_with(fs, CacheConfig::default());
        let path = Path::new("/repo/a.ts");

        cache.parse_file(path, Some("const a = 1;")).unwrap();
        let (_, same) = cache.parse_file(path, Some("const a = 1;")).unwrap();
        assert_eq!(same, ParseOutcome::Cached);

        let (parsed, changed) = cache.parse_file(path, Some("const a = 2;")).unwrap();
        assert_eq!(changed, ParseOutcome::Incremental);
        assert_eq!(&*parsed.content, "const a = 2;");
    }

    #[test]
    fn test_unreadable_file_yields_none() {
        let fs = Arc::new(MemoryFileSystem::new());
        let cache = cache_with(fs, CacheConfig::default());
        assert!(cache.get_parsed_tree(Path::new("/repo/missing.ts"), None).is_none());
        assert!(cache.get_parsed_tree(Path::new("/repo/notes.txt"), Some("x")).is_none());
    }

    #[test]
    fn test_vue_script_block_is_parsed() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write(
            "/repo/Hello.vue",
            "<template><div/></template>\n<script lang=\"ts\">\nexport default {}\n</script>\n",
        );
        let cache = cache_with(fs, CacheConfig::default());
        let parsed = cache
            .get_parsed_tree(Path::new("/repo/Hello.vue"), None)
            .unwrap();
        assert_eq!(parsed.lang, Lang::Vue);
        assert_eq!(parsed.script_lang, Lang::TypeScript);
        let sfc = parsed.sfc.unwrap();
        assert!(sfc.has_script);
        assert!(!sfc.is_setup);
        assert_eq!(sfc.line_offset, 1);
    }

    #[test]
    fn test_extraction_goes_stale_on_change() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write("/repo/a.ts", "export function a() {}");
        let cache = cache_with(fs.clone(), CacheConfig::default());
        let path = Path::new("/repo/a.ts");

        cache.get_parsed_tree(path, None).unwrap();
        cache.set_extraction(ExtractorKind::Script, path, vec![entity("a")]);
        assert_eq!(cache.get_extraction(ExtractorKind::Script, path).unwrap().len(), 1);
        assert!(cache
            .get_extraction(ExtractorKind::SingleFileComponent, path)
            .is_none());

        fs.write("/repo/a.ts", "export function b() {}");
        assert!(cache.get_extraction(ExtractorKind::Script, path).is_none());
        assert_eq!(cache.stats().extraction_entries, 0);
    }

    #[test]
    fn test_cleanup_evicts_oldest_half() {
        let fs = Arc::new(MemoryFileSystem::new());
        let config = CacheConfig {
            max_bytes: 4,
            cleanup_threshold: 1.0,
            parsed_file_bytes: 0,
            entity_bytes: 1,
            ..CacheConfig::default()
        };
        for name in ["a", "b", "c", "d", "e", "f"] {
            fs.write(format!("/repo/{}.ts", name), "export {}");
        }
        let cache = cache_with(fs, config);

        for name in ["a", "b", "c", "d", "e"] {
            let path = PathBuf::from(format!("/repo/{}.ts", name));
            cache.set_extraction(ExtractorKind::Script, &path, vec![entity(name)]);
        }
        // 5 entities > 4 bytes: the next insert evicts a and b first
        cache.set_extraction(
            ExtractorKind::Script,
            Path::new("/repo/f.ts"),
            vec![entity("f")],
        );

        assert!(cache
            .get_extraction(ExtractorKind::Script, Path::new("/repo/a.ts"))
            .is_none());
        assert!(cache
            .get_extraction(ExtractorKind::Script, Path::new("/repo/b.ts"))
            .is_none());
        assert!(cache
            .get_extraction(ExtractorKind::Script, Path::new("/repo/c.ts"))
            .is_some());
        assert_eq!(cache.stats().extraction_entries, 4);
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write("/repo/a.ts", "export {}");
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        let cache = cache_with(fs, config);
        let path = Path::new("/repo/a.ts");
        cache.set_extraction(ExtractorKind::Script, path, vec![entity("a")]);
        assert!(cache.get_extraction(ExtractorKind::Script, path).is_none());
    }

    #[test]
    fn test_clear_extractor_and_file() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write("/repo/a.ts", "export {}");
        fs.write("/repo/B.vue", "<script>export default {}</script>");
        let cache = cache_with(fs, CacheConfig::default());

        cache.get_parsed_tree(Path::new("/repo/a.ts"), None).unwrap();
        cache.set_extraction(ExtractorKind::Script, Path::new("/repo/a.ts"), vec![]);
        cache.set_extraction(
            ExtractorKind::SingleFileComponent,
            Path::new("/repo/B.vue"),
            vec![],
        );

        assert_eq!(cache.clear_extractor_cache(ExtractorKind::SingleFileComponent), 1);
        assert_eq!(cache.stats().extraction_entries, 1);

        cache.clear_file(Path::new("/repo/a.ts"));
        assert!(!cache.contains(Path::new("/repo/a.ts")));
        assert_eq!(cache.stats().extraction_entries, 0);

        cache.clear_all();
        assert_eq!(cache.stats().parsed_files, 0);
    }
}
