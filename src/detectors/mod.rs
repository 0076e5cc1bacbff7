//! Entity extractors
//!
//! Turn one parsed file into the ordered list of its top-level exported
//! entities.
//!
//! # Architecture
//!
//! Extraction has three layers:
//!
//! 1. **Declarations** (`declaration.rs`): top-level statements lifted out of
//!    the tree-sitter tree into a closed set of shapes, with the facts
//!    classification needs precomputed.
//!
//! 2. **Classification** (`rules.rs`, `classify.rs`): name predicates, the
//!    ordered naming fallback, and the per-file classifier that resolves
//!    local references.
//!
//! 3. **Extractors** (`script.rs`, `vue.rs`): one per extractor kind, mapping
//!    declarations to [`Entity`] records.
//!
//! Extractors never fail: a file that cannot be read or parsed yields an
//! empty list and a logged warning.

pub mod classify;
pub mod common;
pub mod declaration;
pub mod rules;
pub mod script;
pub mod vue;

use crate::config::ResolveConfig;
use crate::fs::{file_stem, is_entry_file, parent_dir_name};
use crate::lang::Lang;
use crate::schema::Entity;
use crate::source_cache::ParsedSource;

pub use script::ScriptExtractor;
pub use vue::SfcExtractor;

/// Which extractor produced a cached result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorKind {
    /// `.ts`, `.tsx`, `.js`, `.jsx`
    Script,
    /// `.vue`
    SingleFileComponent,
}

impl ExtractorKind {
    pub fn for_lang(lang: Lang) -> Self {
        if lang.is_single_file_component() {
            Self::SingleFileComponent
        } else {
            Self::Script
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::SingleFileComponent => "sfc",
        }
    }
}

/// Per-file inputs shared by all extractors
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Workspace-relative path, `/`-separated
    pub rel_path: &'a str,
    pub resolve: &'a ResolveConfig,
}

impl<'a> ExtractContext<'a> {
    /// Name a default export is minted under
    pub fn default_name(&self, declared: Option<&str>) -> String {
        default_export_name(self.rel_path, declared, &self.resolve.entry_files)
    }
}

/// Name a file's default export is minted under
///
/// Normally the file's base name. Entry files (`index.*`) use the declared
/// identifier when there is one, else the directory name.
pub fn default_export_name(path: &str, declared: Option<&str>, entry_files: &[String]) -> String {
    if is_entry_file(path, entry_files) {
        if let Some(name) = declared.filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(dir) = parent_dir_name(path) {
            return dir.to_string();
        }
    }
    file_stem(path).to_string()
}

/// Common interface for the extractors
pub trait EntityExtractor: Send + Sync {
    fn kind(&self) -> ExtractorKind;

    /// Entities of one parsed file, in source order
    fn extract(&self, parsed: &ParsedSource, ctx: &ExtractContext) -> Vec<Entity>;
}

static SCRIPT: ScriptExtractor = ScriptExtractor;
static SFC: SfcExtractor = SfcExtractor;

/// Extractor responsible for files of `lang`
pub fn extractor_for(lang: Lang) -> &'static dyn EntityExtractor {
    match ExtractorKind::for_lang(lang) {
        ExtractorKind::Script => &SCRIPT,
        ExtractorKind::SingleFileComponent => &SFC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<String> {
        ResolveConfig::default().entry_files
    }

    #[test]
    fn test_default_export_name() {
        assert_eq!(
            default_export_name("src/widgets/Button.tsx", Some("Whatever"), &entries()),
            "Button"
        );
        assert_eq!(
            default_export_name("src/services/index.ts", Some("ApiService"), &entries()),
            "ApiService"
        );
        assert_eq!(
            default_export_name("src/services/index.ts", None, &entries()),
            "services"
        );
        assert_eq!(default_export_name("index.ts", None, &entries()), "index");
    }

    #[test]
    fn test_extractor_for() {
        assert_eq!(extractor_for(Lang::Tsx).kind(), ExtractorKind::Script);
        assert_eq!(extractor_for(Lang::Vue).kind(), ExtractorKind::SingleFileComponent);
    }
}
