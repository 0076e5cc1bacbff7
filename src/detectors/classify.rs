//! Entity kind of a declaration, in the context of its file
//!
//! Classification needs the rest of the file: `export default Button` and
//! `export const Card = memo(CardInner)` take their kind from a local
//! declaration. [`FileClassifier`] holds a file's declarations and resolves
//! such references.

use super::declaration::{ClassFacts, DeclKind, Declaration, ValueShape};
use super::rules::{is_component_base, is_component_wrapper, is_constant_name, naming_fallback, ClassifyContext, NamingInput};
use super::default_export_name;
use crate::schema::EntityKind;

/// Alias chains longer than this are treated as unresolved
const MAX_ALIAS_DEPTH: usize = 8;

/// Classifies declarations of one file
pub struct FileClassifier<'a> {
    decls: &'a [Declaration],
    ctx: ClassifyContext<'a>,
    path: &'a str,
}

impl<'a> FileClassifier<'a> {
    pub fn new(decls: &'a [Declaration], ctx: ClassifyContext<'a>, path: &'a str) -> Self {
        Self { decls, ctx, path }
    }

    pub fn context(&self) -> &ClassifyContext<'a> {
        &self.ctx
    }

    /// Kind of `decl` when minted under `name`
    ///
    /// For variable statements `name` selects the binding (the first one
    /// when no binding matches).
    pub fn kind_of(&self, decl: &Declaration, name: &str) -> EntityKind {
        self.kind_at_depth(decl, name, 0)
    }

    fn kind_at_depth(&self, decl: &Declaration, name: &str, depth: usize) -> EntityKind {
        match &decl.kind {
            DeclKind::Function { returns_markup, .. } => {
                if self.ctx.callable_is_component(name, *returns_markup) {
                    EntityKind::Component
                } else {
                    EntityKind::Function
                }
            }
            DeclKind::Class { facts, .. } => self.class_kind(name, facts),
            DeclKind::Type { kind, .. } => *kind,
            DeclKind::Variable(bindings) => {
                let binding = bindings
                    .iter()
                    .find(|b| b.name == name)
                    .or_else(|| bindings.first());
                match binding {
                    Some(b) => self.binding_kind(&b.name, &b.value, depth),
                    None => EntityKind::Variable,
                }
            }
            DeclKind::ExportAssignment(value) => self.export_value_kind(value, name, depth),
            DeclKind::ExportClause(specs) => specs
                .iter()
                .find(|s| s.exported == name)
                .or_else(|| specs.iter().find(|s| s.exported == "default"))
                .and_then(|s| self.local_kind(&s.local, depth + 1))
                .unwrap_or_else(|| self.fallback(name)),
            DeclKind::DefineComponentCall => EntityKind::Component,
        }
    }

    /// Kind of the module-scope declaration bound to `name`, if any
    pub fn local_kind(&self, name: &str, depth: usize) -> Option<EntityKind> {
        if depth > MAX_ALIAS_DEPTH {
            return None;
        }
        self.decls
            .iter()
            .find(|d| d.binds(name))
            .map(|d| self.kind_at_depth(d, name, depth))
    }

    fn class_kind(&self, name: &str, facts: &ClassFacts) -> EntityKind {
        let extends_component = facts
            .superclass
            .as_deref()
            .map(is_component_base)
            .unwrap_or(false);

        let component = facts.component_decorator
            || (self.ctx.markup && extends_component)
            || self.ctx.callable_is_component(name, facts.renders_markup);

        if component {
            EntityKind::Component
        } else {
            EntityKind::Class
        }
    }

    /// Kind of a `const`/`let`/`var` binding
    fn binding_kind(&self, name: &str, value: &ValueShape, depth: usize) -> EntityKind {
        if is_constant_name(name) {
            return EntityKind::Variable;
        }

        match value {
            ValueShape::Absent | ValueShape::Literal | ValueShape::Object | ValueShape::Array => {
                EntityKind::Variable
            }
            ValueShape::Function { returns_markup } => {
                if self.ctx.callable_is_component(name, *returns_markup) {
                    EntityKind::Component
                } else {
                    EntityKind::Function
                }
            }
            ValueShape::Class(facts) => self.class_kind(name, facts),
            ValueShape::Identifier(target) => self
                .local_kind(target, depth + 1)
                .unwrap_or(EntityKind::Variable),
            ValueShape::Call(call) => {
                if self.ctx.markup && call.returns_markup {
                    return EntityKind::Component;
                }
                if is_component_wrapper(&call.callee) {
                    if let Some(kind) = call
                        .first_identifier
                        .as_deref()
                        .and_then(|wrapped| self.local_kind(wrapped, depth + 1))
                    {
                        return kind;
                    }
                }
                EntityKind::Variable
            }
            ValueShape::Other => EntityKind::Variable,
        }
    }

    /// Kind of an `export default <expr>` / `export = <expr>` value
    fn export_value_kind(&self, value: &ValueShape, name: &str, depth: usize) -> EntityKind {
        match value {
            ValueShape::Absent | ValueShape::Literal | ValueShape::Object | ValueShape::Array => {
                if self.ctx.single_file_component {
                    EntityKind::Component
                } else {
                    EntityKind::Variable
                }
            }
            ValueShape::Function { returns_markup } => {
                if self.ctx.callable_is_component(name, *returns_markup) {
                    EntityKind::Component
                } else {
                    EntityKind::Function
                }
            }
            ValueShape::Class(facts) => self.class_kind(name, facts),
            ValueShape::Identifier(target) => self
                .local_kind(target, depth + 1)
                .unwrap_or_else(|| self.fallback(target)),
            ValueShape::Call(call) => {
                if super::declaration::is_define_component(&call.callee) {
                    return EntityKind::Component;
                }
                if self.ctx.markup && call.returns_markup {
                    return EntityKind::Component;
                }
                if is_component_wrapper(&call.callee) {
                    return call
                        .first_identifier
                        .as_deref()
                        .and_then(|wrapped| self.local_kind(wrapped, depth + 1))
                        .unwrap_or(EntityKind::Component);
                }
                EntityKind::Function
            }
            ValueShape::Other => EntityKind::Function,
        }
    }

    /// Naming rules for a name that has no declaration to inspect
    pub fn fallback(&self, name: &str) -> EntityKind {
        naming_fallback(&NamingInput {
            path: self.path,
            name,
            markup: self.ctx.markup,
            ui_keywords: self.ctx.ui_keywords,
        })
    }

    /// Kind and id name of a default-export declaration
    ///
    /// The id name follows [`default_export_name`]; the declared name (when
    /// there is one) drives the name-based component heuristics.
    pub fn default_identity(&self, decl: &Declaration, entry_files: &[String]) -> (EntityKind, String) {
        let declared = decl.declared_name();
        let id_name = default_export_name(self.path, declared, entry_files);
        let kind = self.kind_of(decl, declared.unwrap_or(&id_name));
        (kind, id_name)
    }

    /// First default-export declaration of the file
    pub fn default_export(&self) -> Option<&'a Declaration> {
        self.decls.iter().find(|d| d.is_default())
    }

    /// Declaration exporting `name`
    pub fn named_export(&self, name: &str) -> Option<&'a Declaration> {
        self.decls.iter().find(|d| d.exports_name(name))
    }
}
