//! Top-level declarations of a script, lifted out of the syntax tree
//!
//! Every statement the extractors care about becomes one [`Declaration`]:
//! a closed set of shapes ([`DeclKind`]) plus how it is exported
//! ([`ExportForm`]). The facts classification needs (does a body build
//! markup, what does a class extend, what shape is an initializer) are
//! computed here once, so the rules in [`super::rules`] and
//! [`super::classify`] never touch tree-sitter nodes.

use tree_sitter::Node;

use super::common::{field_text, get_node_text, hash_text, line_span, returns_markup, unwrap_expression};
use crate::schema::{EntityKind, LineSpan};

/// How a declaration leaves its module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportForm {
    /// Not exported
    Local,
    /// `export <decl>` or `export { ... }`
    Named,
    /// `export default ...` or `export = ...`
    Default,
}

/// Syntactic shape of an initializer or exported expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueShape {
    /// No initializer (`let x;`)
    Absent,
    /// String, template, number, boolean, null, undefined or regex literal
    Literal,
    Object,
    Array,
    /// Arrow function or function expression
    Function { returns_markup: bool },
    /// Class expression
    Class(ClassFacts),
    /// Bare identifier, e.g. `export default Button`
    Identifier(String),
    /// Call expression
    Call(CallFacts),
    /// Anything else (member access, `new`, JSX value, ...)
    Other,
}

/// Facts about a class declaration or expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFacts {
    /// Any member constructs markup (e.g. a `render` method returning JSX)
    pub renders_markup: bool,
    /// Text of the `extends` target, e.g. `React.Component`
    pub superclass: Option<String>,
    /// Decorated with `@Component`
    pub component_decorator: bool,
}

/// Facts about a call expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallFacts {
    /// Callee text, e.g. `React.memo` or `defineComponent`
    pub callee: String,
    /// First bare-identifier argument
    pub first_identifier: Option<String>,
    /// Some argument constructs markup
    pub returns_markup: bool,
}

/// One name bound by a `const`/`let`/`var` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value: ValueShape,
}

/// One specifier of a local `export { a, b as c }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

/// Closed set of declaration shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    Function {
        name: Option<String>,
        returns_markup: bool,
    },
    Class {
        name: Option<String>,
        facts: ClassFacts,
    },
    Variable(Vec<Binding>),
    /// Interface, type alias or enum
    Type { name: String, kind: EntityKind },
    /// `export default <expr>` or `export = <expr>`
    ExportAssignment(ValueShape),
    /// `export { ... }` without a `from` clause
    ExportClause(Vec<ExportSpecifier>),
    /// Top-level `defineComponent(...)` expression statement
    DefineComponentCall,
}

/// A top-level statement relevant to entity extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub export: ExportForm,
    /// Span of the whole statement, including any `export` keyword
    pub span: LineSpan,
    /// Hex SHA-256 of the statement text
    pub code_hash: String,
    pub kind: DeclKind,
}

impl Declaration {
    pub fn is_exported(&self) -> bool {
        self.export != ExportForm::Local
    }

    pub fn is_default(&self) -> bool {
        self.export == ExportForm::Default
            || matches!(&self.kind, DeclKind::ExportClause(specs)
                if specs.iter().any(|s| s.exported == "default"))
    }

    /// Name the declaration introduces, when it introduces exactly one
    pub fn declared_name(&self) -> Option<&str> {
        match &self.kind {
            DeclKind::Function { name, .. } | DeclKind::Class { name, .. } => name.as_deref(),
            DeclKind::Type { name, .. } => Some(name),
            DeclKind::Variable(bindings) => bindings.first().map(|b| b.name.as_str()),
            DeclKind::ExportAssignment(value) => match value {
                ValueShape::Identifier(name) => Some(name),
                ValueShape::Call(call) => call.first_identifier.as_deref(),
                _ => None,
            },
            DeclKind::ExportClause(specs) => specs
                .iter()
                .find(|s| s.exported == "default")
                .map(|s| s.local.as_str()),
            DeclKind::DefineComponentCall => None,
        }
    }

    /// Whether this declaration binds `name` in module scope
    pub fn binds(&self, name: &str) -> bool {
        match &self.kind {
            DeclKind::Function { name: Some(n), .. } | DeclKind::Class { name: Some(n), .. } => {
                n == name
            }
            DeclKind::Type { name: n, .. } => n == name,
            DeclKind::Variable(bindings) => bindings.iter().any(|b| b.name == name),
            _ => false,
        }
    }

    /// Whether this declaration exports something under `name`
    pub fn exports_name(&self, name: &str) -> bool {
        match &self.kind {
            DeclKind::ExportClause(specs) => specs.iter().any(|s| s.exported == name),
            _ => self.export == ExportForm::Named && self.binds(name),
        }
    }
}

/// Collect the top-level declarations of a parsed script, in source order
pub fn collect_declarations(root: &Node, source: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut cursor = root.walk();

    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "export_statement" => {
                if let Some(decl) = lift_export(&child, source) {
                    declarations.push(decl);
                }
            }
            "expression_statement" => {
                if is_define_component_call(&child, source) {
                    declarations.push(Declaration {
                        export: ExportForm::Local,
                        span: line_span(&child),
                        code_hash: hash_text(&get_node_text(&child, source)),
                        kind: DeclKind::DefineComponentCall,
                    });
                }
            }
            _ => {
                if let Some(kind) = lift_declaration(&child, source, false) {
                    declarations.push(Declaration {
                        export: ExportForm::Local,
                        span: line_span(&child),
                        code_hash: hash_text(&get_node_text(&child, source)),
                        kind,
                    });
                }
            }
        }
    }

    declarations
}

fn lift_export(node: &Node, source: &str) -> Option<Declaration> {
    // Re-exports from another module declare nothing here
    if node.child_by_field_name("source").is_some() {
        return None;
    }

    let mut is_default = false;
    let mut is_assignment = false;
    let mut decorated = false;
    let mut clause = None;
    let mut assigned = None;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "default" => is_default = true,
            "=" => is_assignment = true,
            "decorator" => decorated |= is_component_decorator(&child, source),
            "export_clause" => clause = Some(child),
            _ if is_assignment && assigned.is_none() && child.is_named() => assigned = Some(child),
            _ => {}
        }
    }

    let export = if is_default || is_assignment {
        ExportForm::Default
    } else {
        ExportForm::Named
    };

    let kind = if let Some(decl) = node.child_by_field_name("declaration") {
        let mut kind = lift_declaration(&decl, source, decorated)?;
        if let DeclKind::Class { facts, .. } = &mut kind {
            facts.component_decorator |= decorated;
        }
        kind
    } else if let Some(value) = node.child_by_field_name("value").or(assigned) {
        if let Some(kind) = named_expression(&value, source, decorated) {
            kind
        } else {
            let mut shape = value_shape(&value, source);
            if let ValueShape::Class(facts) = &mut shape {
                facts.component_decorator |= decorated;
            }
            DeclKind::ExportAssignment(shape)
        }
    } else if let Some(clause) = clause {
        DeclKind::ExportClause(export_specifiers(&clause, source))
    } else {
        return None;
    };

    Some(Declaration {
        export,
        span: line_span(node),
        code_hash: hash_text(&get_node_text(node, source)),
        kind,
    })
}

fn lift_declaration(node: &Node, source: &str, decorated: bool) -> Option<DeclKind> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => Some(DeclKind::Function {
            name: field_text(node, "name", source),
            returns_markup: returns_markup(node),
        }),
        "class_declaration" | "abstract_class_declaration" => Some(DeclKind::Class {
            name: field_text(node, "name", source),
            facts: class_facts(node, source, decorated),
        }),
        "lexical_declaration" | "variable_declaration" => {
            Some(DeclKind::Variable(bindings(node, source)))
        }
        "interface_declaration" => type_decl(node, source, EntityKind::Interface),
        "type_alias_declaration" => type_decl(node, source, EntityKind::TypeAlias),
        "enum_declaration" => type_decl(node, source, EntityKind::Enum),
        _ => None,
    }
}

/// `export default function Name() {}` and `export default class Name {}`
/// may parse as named expressions; keep their names
fn named_expression(node: &Node, source: &str, decorated: bool) -> Option<DeclKind> {
    let name = field_text(node, "name", source)?;
    match node.kind() {
        "function_expression" | "function" | "generator_function" => Some(DeclKind::Function {
            name: Some(name),
            returns_markup: returns_markup(node),
        }),
        "class" => Some(DeclKind::Class {
            name: Some(name),
            facts: class_facts(node, source, decorated),
        }),
        _ => None,
    }
}

fn type_decl(node: &Node, source: &str, kind: EntityKind) -> Option<DeclKind> {
    Some(DeclKind::Type {
        name: field_text(node, "name", source)?,
        kind,
    })
}

fn bindings(node: &Node, source: &str) -> Vec<Binding> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = declarator.child_by_field_name("name") else {
            continue;
        };
        let value = declarator
            .child_by_field_name("value")
            .map(|v| value_shape(&v, source))
            .unwrap_or(ValueShape::Absent);

        if name.kind() == "identifier" {
            out.push(Binding {
                name: get_node_text(&name, source),
                value,
            });
        } else {
            // Destructuring: every bound identifier is its own binding
            for ident in pattern_identifiers(&name, source) {
                out.push(Binding {
                    name: ident,
                    value: ValueShape::Other,
                });
            }
        }
    }
    out
}

fn pattern_identifiers(pattern: &Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    collect_pattern_names(pattern, source, &mut names);
    names
}

fn collect_pattern_names(pattern: &Node, source: &str, names: &mut Vec<String>) {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            names.push(get_node_text(pattern, source))
        }
        "pair_pattern" => {
            if let Some(value) = pattern.child_by_field_name("value") {
                collect_pattern_names(&value, source, names);
            }
        }
        // Only the left side of `a = fallback` binds
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = pattern.child_by_field_name("left") {
                collect_pattern_names(&left, source, names);
            }
        }
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            let mut cursor = pattern.walk();
            for child in pattern.named_children(&mut cursor) {
                collect_pattern_names(&child, source, names);
            }
        }
        _ => {}
    }
}

fn export_specifiers(clause: &Node, source: &str) -> Vec<ExportSpecifier> {
    let mut specs = Vec::new();
    let mut cursor = clause.walk();
    for spec in clause.named_children(&mut cursor) {
        if spec.kind() != "export_specifier" {
            continue;
        }
        let Some(local) = field_text(&spec, "name", source) else {
            continue;
        };
        let exported = field_text(&spec, "alias", source).unwrap_or_else(|| local.clone());
        specs.push(ExportSpecifier { local, exported });
    }
    specs
}

/// Classify the syntactic shape of an expression
pub fn value_shape(node: &Node, source: &str) -> ValueShape {
    let node = unwrap_expression(*node);
    match node.kind() {
        "string" | "template_string" | "number" | "true" | "false" | "null" | "undefined"
        | "regex" => ValueShape::Literal,
        "unary_expression" => match node.named_child(0).map(|n| n.kind()) {
            Some("number") => ValueShape::Literal,
            _ => ValueShape::Other,
        },
        "object" => ValueShape::Object,
        "array" => ValueShape::Array,
        "arrow_function" | "function_expression" | "function" | "generator_function" => {
            ValueShape::Function {
                returns_markup: returns_markup(&node),
            }
        }
        "class" => ValueShape::Class(class_facts(&node, source, false)),
        "identifier" => ValueShape::Identifier(get_node_text(&node, source)),
        "call_expression" => ValueShape::Call(call_facts(&node, source)),
        _ => ValueShape::Other,
    }
}

fn call_facts(node: &Node, source: &str) -> CallFacts {
    let callee = field_text(node, "function", source).unwrap_or_default();
    let mut first_identifier = None;
    let mut builds_markup = false;

    if let Some(args) = node.child_by_field_name("arguments") {
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            if first_identifier.is_none() && arg.kind() == "identifier" {
                first_identifier = Some(get_node_text(&arg, source));
            }
            builds_markup |= returns_markup(&arg);
        }
    }

    CallFacts {
        callee,
        first_identifier,
        returns_markup: builds_markup,
    }
}

fn class_facts(node: &Node, source: &str, decorated: bool) -> ClassFacts {
    let mut facts = ClassFacts {
        renders_markup: node
            .child_by_field_name("body")
            .map(|body| returns_markup(&body))
            .unwrap_or(false),
        superclass: None,
        component_decorator: decorated,
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "class_heritage" => facts.superclass = extends_target(&child, source),
            "decorator" => facts.component_decorator |= is_component_decorator(&child, source),
            _ => {}
        }
    }

    facts
}

/// Target of the `extends` clause in a class heritage
fn extends_target(heritage: &Node, source: &str) -> Option<String> {
    let text = get_node_text(heritage, source);
    let rest = text.trim_start().strip_prefix("extends")?;
    let target: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$' || *c == '.')
        .collect();
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}

fn is_component_decorator(decorator: &Node, source: &str) -> bool {
    let text = get_node_text(decorator, source);
    let name: String = text
        .trim_start_matches('@')
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '.')
        .collect();
    name == "Component" || name.ends_with(".Component")
}

fn is_define_component_call(statement: &Node, source: &str) -> bool {
    statement
        .named_child(0)
        .map(unwrap_expression)
        .filter(|expr| expr.kind() == "call_expression")
        .and_then(|call| field_text(&call, "function", source))
        .map(|callee| is_define_component(&callee))
        .unwrap_or(false)
}

/// Whether a callee is Vue's `defineComponent`
pub fn is_define_component(callee: &str) -> bool {
    callee == "defineComponent" || callee.ends_with(".defineComponent")
}
