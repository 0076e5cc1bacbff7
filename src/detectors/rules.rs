//! Name and shape predicates behind entity classification
//!
//! The naming fallback is an explicit ordered rule list: the first rule whose
//! predicate holds decides the kind, and [`EntityKind::Function`] is the
//! default when none does.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lang::is_sfc_path;
use crate::schema::EntityKind;

/// `PI_APPROX`, `API_URL`, `X`
static CONSTANT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("valid regex"));

/// `Button`, `ApiService`
static PASCAL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-zA-Z0-9]*$").expect("valid regex"));

/// Superclasses that make a class a UI component in markup files
const COMPONENT_BASES: &[&str] = &[
    "Component",
    "PureComponent",
    "React.Component",
    "React.PureComponent",
];

/// Wrapper calls whose result is the wrapped component
const COMPONENT_WRAPPERS: &[&str] = &["memo", "forwardRef", "observer"];

pub fn is_constant_name(name: &str) -> bool {
    CONSTANT_NAME.is_match(name)
}

pub fn is_pascal_case(name: &str) -> bool {
    PASCAL_NAME.is_match(name)
}

pub fn has_ui_keyword(name: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| name.contains(k.as_str()))
}

pub fn is_component_base(superclass: &str) -> bool {
    COMPONENT_BASES.contains(&superclass)
}

/// `memo`, `React.memo`, `forwardRef`, `observer`, ...
pub fn is_component_wrapper(callee: &str) -> bool {
    let last = callee.rsplit('.').next().unwrap_or(callee);
    COMPONENT_WRAPPERS.contains(&last)
}

/// Where a declaration lives, as far as classification cares
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    /// The file may construct markup (`.tsx`, `.jsx`, `.vue`)
    pub markup: bool,
    /// The file is a single-file component
    pub single_file_component: bool,
    pub ui_keywords: &'a [String],
}

impl<'a> ClassifyContext<'a> {
    /// Component heuristic outside markup files: a PascalCase name with a
    /// UI keyword in it
    pub fn named_like_component(&self, name: &str) -> bool {
        is_pascal_case(name) && has_ui_keyword(name, self.ui_keywords)
    }

    /// Component heuristic for callables (functions and classes)
    pub fn callable_is_component(&self, name: &str, builds_markup: bool) -> bool {
        if self.markup {
            builds_markup || self.single_file_component
        } else {
            self.named_like_component(name)
        }
    }
}

// ============================================================================
// Naming fallback
// ============================================================================

/// Input to the naming fallback
#[derive(Debug, Clone, Copy)]
pub struct NamingInput<'a> {
    /// Path as requested (may be a directory)
    pub path: &'a str,
    /// Name the id will carry
    pub name: &'a str,
    /// Markup context of the file (`.tsx`/`.jsx`/`.vue`)
    pub markup: bool,
    pub ui_keywords: &'a [String],
}

/// One rule of the naming fallback
pub struct NamingRule {
    pub label: &'static str,
    pub applies: fn(&NamingInput) -> bool,
    pub kind: EntityKind,
}

fn sfc_file(input: &NamingInput) -> bool {
    is_sfc_path(input.path)
}

fn constant(input: &NamingInput) -> bool {
    is_constant_name(input.name)
}

fn pascal_in_markup(input: &NamingInput) -> bool {
    input.markup && is_pascal_case(input.name)
}

fn pascal_with_ui_keyword(input: &NamingInput) -> bool {
    is_pascal_case(input.name) && has_ui_keyword(input.name, input.ui_keywords)
}

fn pascal(input: &NamingInput) -> bool {
    is_pascal_case(input.name)
}

/// Ordered naming rules; first match wins
pub static NAMING_RULES: &[NamingRule] = &[
    NamingRule {
        label: "single-file component",
        applies: sfc_file,
        kind: EntityKind::Component,
    },
    NamingRule {
        label: "constant name",
        applies: constant,
        kind: EntityKind::Variable,
    },
    NamingRule {
        label: "capitalized name in markup file",
        applies: pascal_in_markup,
        kind: EntityKind::Component,
    },
    NamingRule {
        label: "capitalized name with UI keyword",
        applies: pascal_with_ui_keyword,
        kind: EntityKind::Component,
    },
    NamingRule {
        label: "capitalized name",
        applies: pascal,
        kind: EntityKind::Class,
    },
];

/// Kind by naming rules alone
pub fn naming_fallback(input: &NamingInput) -> EntityKind {
    match NAMING_RULES.iter().find(|rule| (rule.applies)(input)) {
        Some(rule) => {
            tracing::trace!("[RESOLVE] {} -> {} ({})", input.name, rule.kind, rule.label);
            rule.kind
        }
        None => EntityKind::Function,
    }
}
