//! Vue Single File Component support
//!
//! - Cutting the `<script>` block out of a `.vue` file (the source cache
//!   parses only that block, with the grammar named by its `lang` attribute)
//! - The `.vue` entity extractor: a file is one component, named after the
//!   file

use once_cell::sync::Lazy;
use regex::Regex;

use super::common::hash_text;
use super::declaration::{collect_declarations, DeclKind};
use super::{EntityExtractor, ExtractContext, ExtractorKind};
use crate::lang::Lang;
use crate::schema::{Entity, EntityKind, LineSpan};
use crate::source_cache::ParsedSource;

// =============================================================================
// Vue SFC Parsing
// =============================================================================

/// Opening `<script ...>` tag with its attributes
static SCRIPT_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<script\b([^>]*)>").expect("valid regex"));

/// `lang="ts"` / `lang='tsx'`
static LANG_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\blang\s*=\s*["']([A-Za-z]+)["']"#).expect("valid regex"));

/// Bare `setup` attribute
static SETUP_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|\s)setup(\s|=|$)").expect("valid regex"));

/// Extracted script content from a Vue SFC
#[derive(Debug)]
pub struct VueSfcScript {
    /// The script content (without script tags)
    pub content: String,
    /// The language (ts, tsx, js, jsx)
    pub lang: Lang,
    /// File line on which the script content starts
    pub start_line: usize,
    /// Whether this is a script setup block
    pub is_setup: bool,
}

/// Extract the script section from a Vue SFC
///
/// A `<script setup>` block wins over a plain `<script>` block when a file
/// has both.
pub fn extract_sfc_script(source: &str) -> Option<VueSfcScript> {
    let mut fallback = None;

    for caps in SCRIPT_OPEN.captures_iter(source) {
        let (Some(tag), Some(attrs)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let content_start = tag.end();
        let Some(content_len) = source[content_start..].find("</script>") else {
            continue;
        };

        let is_setup = SETUP_ATTR.is_match(attrs.as_str());
        let script = VueSfcScript {
            content: source[content_start..content_start + content_len].to_string(),
            lang: detect_script_lang(attrs.as_str()),
            start_line: source[..content_start].lines().count().max(1),
            is_setup,
        };

        if is_setup {
            return Some(script);
        }
        if fallback.is_none() {
            fallback = Some(script);
        }
    }

    fallback
}

/// Detect the script language from the opening tag's attributes
fn detect_script_lang(attrs: &str) -> Lang {
    let lang = LANG_ATTR
        .captures(attrs)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase());

    match lang.as_deref() {
        Some("ts") | Some("typescript") => Lang::TypeScript,
        Some("tsx") => Lang::Tsx,
        Some("jsx") => Lang::Jsx,
        _ => Lang::JavaScript,
    }
}

// =============================================================================
// Extractor
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct SfcExtractor;

impl EntityExtractor for SfcExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::SingleFileComponent
    }

    fn extract(&self, parsed: &ParsedSource, ctx: &ExtractContext) -> Vec<Entity> {
        let Some(sfc) = parsed.sfc.filter(|s| s.has_script) else {
            tracing::debug!("[EXTRACT] {} has no script block", ctx.rel_path);
            return Vec::new();
        };

        let name = ctx.default_name(None);
        let id = EntityKind::Component.id_for(&name);
        let code_hash = hash_text(&parsed.content);
        let component = |loc: LineSpan, raw_name: &str| Entity {
            id: id.clone(),
            kind: EntityKind::Component,
            file: ctx.rel_path.to_string(),
            loc,
            raw_name: raw_name.to_string(),
            default_export: raw_name != "defineComponent",
            code_hash: code_hash.clone(),
        };

        if sfc.is_setup {
            let span = LineSpan::new(sfc.line_offset + 1, sfc.end_line.max(sfc.line_offset + 1));
            return vec![component(span, "setup")];
        }

        let offset = parsed.line_offset();
        let mut entities = Vec::new();
        for decl in collect_declarations(&parsed.tree.root_node(), &parsed.source) {
            let raw_name = match &decl.kind {
                DeclKind::DefineComponentCall => "defineComponent",
                _ if decl.is_default() => "default",
                _ => continue,
            };
            entities.push(component(decl.span.offset(offset), raw_name));
        }

        tracing::debug!("[EXTRACT] {} -> {} entities", ctx.rel_path, entities.len());
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, ResolveConfig};
    use crate::fs::MemoryFileSystem;
    use crate::source_cache::SourceCache;
    use std::path::Path;
    use std::sync::Arc;

    fn extract(rel_path: &str, source: &str) -> Vec<Entity> {
        let fs = Arc::new(MemoryFileSystem::new());
        let path = format!("/repo/{}", rel_path);
        fs.write(path.as_str(), source);
        let cache = SourceCache::new(fs, CacheConfig::default());
        let parsed = cache.get_parsed_tree(Path::new(&path), None).unwrap();
        let resolve = ResolveConfig::default();
        SfcExtractor.extract(
            &parsed,
            &ExtractContext {
                rel_path,
                resolve: &resolve,
            },
        )
    }

    #[test]
    fn test_extract_sfc_script_basic() {
        let vue_file = r#"
<template>
  <div>Hello</div>
</template>

<script>
export default {
  data() {
    return { count: 0 }
  }
}
</script>
"#;
        let script = extract_sfc_script(vue_file).unwrap();
        assert_eq!(script.lang, Lang::JavaScript);
        assert!(!script.is_setup);
        assert!(script.content.contains("export default"));
        assert_eq!(script.start_line, 6);
    }

    #[test]
    fn test_extract_sfc_script_setup_wins() {
        let vue_file = r#"<script lang="ts">
export default { name: 'Counter' }
</script>
<script lang="ts" setup>
import { ref } from 'vue';
const count = ref(0);
</script>
"#;
        let script = extract_sfc_script(vue_file).unwrap();
        assert_eq!(script.lang, Lang::TypeScript);
        assert!(script.is_setup);
        assert!(script.content.contains("ref(0)"));
    }

    #[test]
    fn test_detect_script_lang() {
        assert_eq!(detect_script_lang(""), Lang::JavaScript);
        assert_eq!(detect_script_lang(" lang=\"ts\""), Lang::TypeScript);
        assert_eq!(detect_script_lang(" lang='ts'"), Lang::TypeScript);
        assert_eq!(detect_script_lang(" lang=\"tsx\""), Lang::Tsx);
        assert_eq!(detect_script_lang(" lang=\"jsx\""), Lang::Jsx);
        assert_eq!(detect_script_lang(" setup lang=\"typescript\""), Lang::TypeScript);
    }

    #[test]
    fn test_script_setup_is_one_component() {
        let entities = extract(
            "src/components/Counter.vue",
            "<template><p/></template>\n<script setup>\nimport { ref } from 'vue';\nconst count = ref(0);\n</script>\n",
        );
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, "Component:Counter");
        assert_eq!(entities[0].raw_name, "setup");
        assert_eq!(entities[0].loc.start_line, 2);
    }

    #[test]
    fn test_options_api_default_export() {
        let entities = extract(
            "src/components/Hello.vue",
            "<template><p/></template>\n<script>\nexport default {\n  name: 'Hello'\n}\n</script>\n",
        );
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, "Component:Hello");
        assert_eq!(entities[0].raw_name, "default");
        assert_eq!(entities[0].loc, LineSpan::new(3, 5));
    }

    #[test]
    fn test_define_component_call() {
        let entities = extract(
            "src/Widget.vue",
            "<script lang=\"ts\">\nimport { defineComponent } from 'vue';\ndefineComponent({ name: 'Widget' });\n</script>\n",
        );
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].raw_name, "defineComponent");
        assert_eq!(entities[0].id, "Component:Widget");
    }

    #[test]
    fn test_template_only_file() {
        let entities = extract("src/Static.vue", "<template><p>hi</p></template>\n");
        assert!(entities.is_empty());
    }
}
