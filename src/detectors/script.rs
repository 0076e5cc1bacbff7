//! Extractor for `.ts`, `.tsx`, `.js` and `.jsx` files
//!
//! Every exported top-level declaration becomes one entity (one per binding
//! for multi-binding `const` statements). Re-exports from other modules and
//! non-exported declarations produce nothing.

use super::classify::FileClassifier;
use super::declaration::{collect_declarations, DeclKind, Declaration, ExportForm, ValueShape};
use super::rules::ClassifyContext;
use super::{EntityExtractor, ExtractContext, ExtractorKind};
use crate::fs::module_name;
use crate::schema::{Entity, EntityKind};
use crate::source_cache::ParsedSource;

#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptExtractor;

impl EntityExtractor for ScriptExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Script
    }

    fn extract(&self, parsed: &ParsedSource, ctx: &ExtractContext) -> Vec<Entity> {
        let decls = collect_declarations(&parsed.tree.root_node(), &parsed.source);
        let classify_ctx = ClassifyContext {
            markup: parsed.lang.is_markup_context(),
            single_file_component: false,
            ui_keywords: &ctx.resolve.ui_keywords,
        };
        let classifier = FileClassifier::new(&decls, classify_ctx, ctx.rel_path);

        let mut entities = Vec::new();
        for decl in decls.iter().filter(|d| d.is_exported()) {
            mint_entities(&classifier, decl, ctx, &mut entities);
        }

        tracing::debug!(
            "[EXTRACT] {} -> {} entities from {} declarations",
            ctx.rel_path,
            entities.len(),
            decls.len()
        );
        entities
    }
}

fn mint_entities(
    classifier: &FileClassifier,
    decl: &Declaration,
    ctx: &ExtractContext,
    out: &mut Vec<Entity>,
) {
    let default = decl.export == ExportForm::Default;

    match &decl.kind {
        DeclKind::Function { name, .. } | DeclKind::Class { name, .. } => {
            if default {
                let (kind, id_name) = classifier.default_identity(decl, &ctx.resolve.entry_files);
                let raw = name
                    .clone()
                    .unwrap_or_else(|| module_name(ctx.rel_path, &ctx.resolve.entry_files));
                out.push(entity(decl, ctx, kind, &id_name, raw, true));
            } else if let Some(name) = name {
                let kind = classifier.kind_of(decl, name);
                out.push(entity(decl, ctx, kind, name, name.clone(), false));
            }
        }
        DeclKind::Type { name, kind } => {
            let id_name = if default {
                ctx.default_name(Some(name))
            } else {
                name.clone()
            };
            out.push(entity(decl, ctx, *kind, &id_name, name.clone(), default));
        }
        DeclKind::Variable(bindings) => {
            for binding in bindings {
                let kind = classifier.kind_of(decl, &binding.name);
                let id_name = if default {
                    ctx.default_name(Some(&binding.name))
                } else {
                    binding.name.clone()
                };
                out.push(entity(decl, ctx, kind, &id_name, binding.name.clone(), default));
            }
        }
        DeclKind::ExportAssignment(shape) => {
            let (kind, id_name) = classifier.default_identity(decl, &ctx.resolve.entry_files);
            // Anonymous functions and classes take the module's name
            let raw = match shape {
                ValueShape::Function { .. } | ValueShape::Class(_) => {
                    module_name(ctx.rel_path, &ctx.resolve.entry_files)
                }
                _ => "default".to_string(),
            };
            out.push(entity(decl, ctx, kind, &id_name, raw, true));
        }
        DeclKind::ExportClause(specs) => {
            for spec in specs {
                // Names not declared in this file (imported bindings) are skipped
                let Some(kind) = classifier.local_kind(&spec.local, 0) else {
                    tracing::trace!(
                        "[EXTRACT] {}: no local declaration for '{}'",
                        ctx.rel_path,
                        spec.local
                    );
                    continue;
                };
                if spec.exported == "default" {
                    let id_name = ctx.default_name(Some(&spec.local));
                    out.push(entity(decl, ctx, kind, &id_name, "default".to_string(), true));
                } else {
                    out.push(entity(decl, ctx, kind, &spec.exported, spec.exported.clone(), false));
                }
            }
        }
        DeclKind::DefineComponentCall => {}
    }
}

fn entity(
    decl: &Declaration,
    ctx: &ExtractContext,
    kind: EntityKind,
    id_name: &str,
    raw_name: String,
    default_export: bool,
) -> Entity {
    Entity {
        id: kind.id_for(id_name),
        kind,
        file: ctx.rel_path.to_string(),
        loc: decl.span,
        raw_name,
        default_export,
        code_hash: decl.code_hash.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LineSpan;
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
        let ctx = ExtractContext {
            rel_path,
            resolve: &resolve,
        };
        ScriptExtractor.extract(&parsed, &ctx)
    }

    fn ids(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_default_component_named_after_file() {
        let entities = extract(
            "src/widgets/Button.tsx",
            "export default function Button() {\n  return <button/>;\n}\n",
        );
        assert_eq!(ids(&entities), vec!["Component:Button"]);
        assert_eq!(entities[0].raw_name, "Button");
        assert!(entities[0].default_export);
        assert_eq!(entities[0].loc, LineSpan::new(1, 3));
        assert_eq!(entities[0].code_hash.len(), 64);
    }

    #[test]
    fn test_mixed_exports_in_source_order() {
        let entities = extract(
            "src/math.ts",
            "const internal = 1;\nexport const PI_APPROX = 3.14;\nexport function area(r: number) { return r; }\nexport class Vector {}\nexport interface Point { x: number }\n",
        );
        assert_eq!(
            ids(&entities),
            vec![
                "Variable:PI_APPROX",
                "Function:area",
                "Class:Vector",
                "Interface:Point"
            ]
        );
    }

    #[test]
    fn test_anonymous_default_export() {
        let entities = extract("src/config.js", "export default { retries: 3 };\n");
        assert_eq!(ids(&entities), vec!["Variable:config"]);
        assert_eq!(entities[0].raw_name, "default");
    }

    #[test]
    fn test_anonymous_function_and_class_take_module_name() {
        let entities = extract("src/util/helpers.ts", "export default function () { return 1; }\n");
        assert_eq!(ids(&entities), vec!["Function:helpers"]);
        assert_eq!(entities[0].raw_name, "helpers");

        let entities = extract("src/shapes/Shape.ts", "export default class {\n  area() { return 0; }\n}\n");
        assert_eq!(ids(&entities), vec!["Class:Shape"]);
        assert_eq!(entities[0].raw_name, "Shape");

        let entities = extract("src/shapes/index.ts", "export default () => 1;\n");
        assert_eq!(ids(&entities), vec!["Function:shapes"]);
        assert_eq!(entities[0].raw_name, "shapes");
    }

    #[test]
    fn test_entry_file_default_uses_declared_name() {
        let entities = extract(
            "src/services/index.ts",
            "export default class ApiService {}\nexport const VERSION = '1';\n",
        );
        assert_eq!(ids(&entities), vec!["Class:ApiService", "Variable:VERSION"]);
        assert_eq!(entities[0].raw_name, "ApiService");
    }

    #[test]
    fn test_export_clause_aliases() {
        let entities = extract(
            "src/util.ts",
            "import { external } from './external';\nfunction slugify(s) { return s; }\nconst LIMIT = 3;\nexport { slugify as toSlug, LIMIT, external };\n",
        );
        assert_eq!(ids(&entities), vec!["Function:toSlug", "Variable:LIMIT"]);
        assert_eq!(entities[0].raw_name, "toSlug");
    }

    #[test]
    fn test_memo_default_export() {
        let entities = extract(
            "src/Card.jsx",
            "function Card() { return <div/>; }\nexport default memo(Card);\n",
        );
        assert_eq!(ids(&entities), vec!["Component:Card"]);
        assert_eq!(entities[0].raw_name, "default");
    }

    #[test]
    fn test_multi_binding_statement() {
        let entities = extract("src/flags.ts", "export const a = 1, b = () => 2;\n");
        assert_eq!(ids(&entities), vec!["Variable:a", "Function:b"]);
    }

    #[test]
    fn test_reexports_produce_nothing() {
        let entities = extract("src/all.ts", "export * from './a';\nexport { b } from './b';\n");
        assert!(entities.is_empty());
    }
}
