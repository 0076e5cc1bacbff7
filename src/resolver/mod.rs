//! Identity resolver
//!
//! Mints canonical `"<Kind>:<Name>"` ids in two modes:
//!
//! - **Extraction mode** ([`EntityResolver::generate_id`]): the caller is
//!   looking at a declaration (or at least a file and a name) and wants the
//!   id it should be registered under.
//! - **Lookup mode** ([`EntityResolver::generate_id_by_lookup`]): the caller
//!   has an import target and wants the id of the entity it refers to,
//!   preferring an entity already registered in the index.
//!
//! All memo tables live in [`ResolverCaches`] and are owned by the resolver
//! instance, so independent workspaces never share state.

mod caches;
mod index;
mod lookup;

use std::path::Path;
use std::slice;
use std::sync::Arc;

use parking_lot::RwLock;

pub use caches::{Classified, LookupKey, ResolverCaches, ResolverStats};
pub use index::{is_under, EntityIndex};

use crate::config::ResolveConfig;
use crate::detectors::classify::FileClassifier;
use crate::detectors::declaration::{collect_declarations, Declaration};
use crate::detectors::default_export_name;
use crate::detectors::rules::{naming_fallback, ClassifyContext, NamingInput};
use crate::fs::{module_name, resolve_entry_file, to_slash, FileSystem};
use crate::lang::Lang;
use crate::schema::{Entity, EntityKind, ResolvedId};
use crate::source_cache::SourceCache;

pub struct EntityResolver {
    source_cache: Arc<SourceCache>,
    config: ResolveConfig,
    index: RwLock<EntityIndex>,
    caches: ResolverCaches,
}

impl EntityResolver {
    pub fn new(source_cache: Arc<SourceCache>, config: ResolveConfig) -> Self {
        Self {
            source_cache,
            config,
            index: RwLock::new(EntityIndex::new()),
            caches: ResolverCaches::new(),
        }
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    fn fs(&self) -> &dyn FileSystem {
        self.source_cache.file_system().as_ref()
    }

    // ------------------------------------------------------------------------
    // Index
    // ------------------------------------------------------------------------

    /// Replace the entity index
    ///
    /// The candidate and final-result caches are left alone; call
    /// [`Self::clear_lookup_caches`] after re-indexing when earlier lookups
    /// must not be served.
    pub fn init_entity_map<'a>(&self, entities: impl IntoIterator<Item = &'a Entity>) {
        let index = EntityIndex::from_entities(entities);
        tracing::info!(
            "[RESOLVE] Indexed {} entities across {} files",
            index.entity_count(),
            index.file_count()
        );
        *self.index.write() = index;
    }

    /// Number of files and entities currently indexed
    pub fn index_size(&self) -> (usize, usize) {
        let index = self.index.read();
        (index.file_count(), index.entity_count())
    }

    // ------------------------------------------------------------------------
    // Extraction mode
    // ------------------------------------------------------------------------

    /// Mint the id for `name` declared in `file`
    ///
    /// With a declaration the kind comes from its shape. Without one the
    /// file's content is classified (a directory resolves to its entry file)
    /// and, when that fails, the naming rules decide. `markup` overrides the
    /// markup context implied by the file extension.
    pub fn generate_id(
        &self,
        file: &Path,
        name: &str,
        is_default: bool,
        decl: Option<&Declaration>,
        markup: Option<bool>,
    ) -> ResolvedId {
        match decl {
            Some(decl) => self.classify_declaration(file, name, is_default, decl, markup),
            None => self.classify_from_content(file, name, is_default, markup),
        }
    }

    fn classify_context(&self, lang: Option<Lang>, markup: Option<bool>) -> ClassifyContext<'_> {
        ClassifyContext {
            markup: markup.unwrap_or_else(|| lang.map(|l| l.is_markup_context()).unwrap_or(false)),
            single_file_component: lang.map(|l| l.is_single_file_component()).unwrap_or(false),
            ui_keywords: &self.config.ui_keywords,
        }
    }

    fn classify_declaration(
        &self,
        file: &Path,
        name: &str,
        is_default: bool,
        decl: &Declaration,
        markup: Option<bool>,
    ) -> ResolvedId {
        let path = to_slash(file);
        let ctx = self.classify_context(Lang::from_path(file).ok(), markup);
        let classifier = FileClassifier::new(slice::from_ref(decl), ctx, &path);

        if is_default {
            let (kind, id_name) = classifier.default_identity(decl, &self.config.entry_files);
            ResolvedId::declared(kind, &id_name)
        } else {
            ResolvedId::declared(classifier.kind_of(decl, name), name)
        }
    }

    fn classify_from_content(
        &self,
        file: &Path,
        name: &str,
        is_default: bool,
        markup: Option<bool>,
    ) -> ResolvedId {
        let path = to_slash(file);
        let key = LookupKey::new(path.clone(), name, is_default);
        if let Some(hit) = self.caches.file_type(&key) {
            return ResolvedId::inferred(hit.kind, &hit.name);
        }

        if let Some(classified) = self.classify_file(file, name, is_default, markup) {
            let resolved = ResolvedId::inferred(classified.kind, &classified.name);
            self.caches.store_file_type(key, classified);
            return resolved;
        }

        let fallback_name = if is_default {
            module_name(&path, &self.config.entry_files)
        } else {
            name.to_string()
        };
        let file_markup = Lang::from_path(file)
            .map(|l| l.is_markup_context())
            .unwrap_or(false);
        let kind = naming_fallback(&NamingInput {
            path: &path,
            name: &fallback_name,
            markup: markup.unwrap_or(file_markup),
            ui_keywords: &self.config.ui_keywords,
        });
        tracing::debug!("[RESOLVE] Naming fallback {}:{} in {}", kind, fallback_name, path);
        ResolvedId::inferred(kind, &fallback_name)
    }

    /// Classify `name` from the declarations of `file`
    fn classify_file(
        &self,
        file: &Path,
        name: &str,
        is_default: bool,
        markup: Option<bool>,
    ) -> Option<Classified> {
        let target = if self.fs().is_dir(file) {
            resolve_entry_file(self.fs(), file, &self.config.entry_files)?
        } else {
            file.to_path_buf()
        };

        let lang = Lang::from_path(&target).ok()?;
        let parsed = self.source_cache.get_parsed_tree(&target, None)?;
        let target_path = to_slash(&target);

        if lang.is_single_file_component() {
            return is_default.then(|| Classified {
                kind: EntityKind::Component,
                name: default_export_name(&target_path, None, &self.config.entry_files),
            });
        }

        let decls = collect_declarations(&parsed.tree.root_node(), &parsed.source);
        let classifier =
            FileClassifier::new(&decls, self.classify_context(Some(lang), markup), &target_path);

        if is_default {
            let decl = classifier.default_export()?;
            let (kind, name) = classifier.default_identity(decl, &self.config.entry_files);
            Some(Classified { kind, name })
        } else {
            let decl = classifier.named_export(name)?;
            Some(Classified {
                kind: classifier.kind_of(decl, name),
                name: name.to_string(),
            })
        }
    }

    // ------------------------------------------------------------------------
    // Cache management
    // ------------------------------------------------------------------------

    pub fn stats(&self) -> ResolverStats {
        self.caches.stats()
    }

    /// Drop the candidate and final-result caches
    pub fn clear_lookup_caches(&self) {
        self.caches.clear_lookups();
        tracing::debug!("[RESOLVE] Cleared lookup caches");
    }

    /// Drop every resolver cache (the index is kept)
    pub fn clear_cache(&self) {
        self.caches.clear_all();
        tracing::info!("[RESOLVE] Cleared resolver caches");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::fs::MemoryFileSystem;
    use crate::schema::Confidence;
    use tree_sitter::Parser;

    fn resolver(fs: Arc<MemoryFileSystem>) -> EntityResolver {
        let cache = Arc::new(SourceCache::new(fs, CacheConfig::default()));
        EntityResolver::new(cache, ResolveConfig::default())
    }

    fn declarations(source: &str, lang: Lang) -> Vec<Declaration> {
        let mut parser = Parser::new();
        parser.set_language(&lang.tree_sitter_language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        collect_declarations(&tree.root_node(), source)
    }

    #[test]
    fn test_generate_id_from_declaration() {
        let resolver = resolver(Arc::new(MemoryFileSystem::new()));
        let decls = declarations(
            "export default function Button() {\n  return <button/>;\n}\n",
            Lang::Tsx,
        );

        let resolved = resolver.generate_id(
            Path::new("src/widgets/Button.tsx"),
            "Button",
            true,
            Some(&decls[0]),
            Some(true),
        );
        assert_eq!(resolved.id, "Component:Button");
        assert_eq!(resolved.confidence, Confidence::Declared);
        assert!(!resolved.is_indexed());
    }

    #[test]
    fn test_generate_id_markup_override() {
        let resolver = resolver(Arc::new(MemoryFileSystem::new()));
        let decls = declarations("export function Panel() {\n  return 1;\n}\n", Lang::TypeScript);
        let file = Path::new("src/Panel.ts");

        // Plain file: a capitalized name with a UI keyword reads as a component
        let plain = resolver.generate_id(file, "Panel", false, Some(&decls[0]), None);
        assert_eq!(plain.id, "Component:Panel");
        assert_eq!(plain.confidence, Confidence::Declared);

        // Markup context: only a body that builds markup counts
        let markup = resolver.generate_id(file, "Panel", false, Some(&decls[0]), Some(true));
        assert_eq!(markup.id, "Function:Panel");
    }

    #[test]
    fn test_generate_id_without_declaration_is_inferred() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.write("/repo/src/math.ts", "export const PI_APPROX = 3.14;\n");
        let resolver = resolver(fs);

        let resolved = resolver.generate_id(Path::new("/repo/src/math.ts"), "PI_APPROX", false, None, None);
        assert_eq!(resolved.id, "Variable:PI_APPROX");
        assert_eq!(resolved.confidence, Confidence::Inferred);
        assert_eq!(resolver.index_size(), (0, 0));
    }
}
