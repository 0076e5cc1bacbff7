//! Entity records and resolution results
//!
//! These are the plain-data types handed to downstream consumers. An
//! [`Entity`] is immutable once produced and its `id` is the join key every
//! consumer uses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a top-level declared entity
///
/// The variant name is also the prefix of the canonical id
/// (`"<Kind>:<Name>"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntityKind {
    /// Plain function, arrow function or function-valued binding
    #[default]
    Function,
    /// UI component (React/Vue)
    Component,
    /// Class declaration or class expression
    Class,
    /// Constant, configuration object or any non-callable binding
    Variable,
    /// TypeScript interface
    Interface,
    /// TypeScript type alias
    TypeAlias,
    /// TypeScript enum
    Enum,
}

impl EntityKind {
    /// The id prefix for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::Component => "Component",
            Self::Class => "Class",
            Self::Variable => "Variable",
            Self::Interface => "Interface",
            Self::TypeAlias => "TypeAlias",
            Self::Enum => "Enum",
        }
    }

    /// Lowercase name, as stored in downstream `type` columns
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Component => "component",
            Self::Class => "class",
            Self::Variable => "variable",
            Self::Interface => "interface",
            Self::TypeAlias => "type_alias",
            Self::Enum => "enum",
        }
    }

    /// Parse an id prefix back into a kind
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "Function" => Some(Self::Function),
            "Component" => Some(Self::Component),
            "Class" => Some(Self::Class),
            "Variable" => Some(Self::Variable),
            "Interface" => Some(Self::Interface),
            "TypeAlias" => Some(Self::TypeAlias),
            "Enum" => Some(Self::Enum),
            _ => None,
        }
    }

    /// Build the canonical id for a name of this kind
    pub fn id_for(&self, name: &str) -> String {
        format!("{}:{}", self.prefix(), name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// 1-based inclusive line range of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LineSpan {
    pub start_line: usize,
    pub end_line: usize,
}

impl LineSpan {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Shift both ends by `offset` lines (used for `.vue` script blocks)
    pub fn offset(self, offset: usize) -> Self {
        Self::new(self.start_line + offset, self.end_line + offset)
    }
}

/// A single top-level exported declaration of one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Canonical `"<Kind>:<Name>"` id
    pub id: String,
    pub kind: EntityKind,
    /// Workspace-relative path, `/`-separated
    pub file: String,
    pub loc: LineSpan,
    /// Declared name, alias, or `"default"` for bare default exports
    pub raw_name: String,
    /// Whether this entity is the file's default export
    #[serde(default)]
    pub default_export: bool,
    /// Hex SHA-256 of the declaration's source text
    #[serde(default)]
    pub code_hash: String,
}

impl Entity {
    /// The name part of the id (everything after the first `:`)
    pub fn id_name(&self) -> &str {
        self.id
            .split_once(':')
            .map(|(_, name)| name)
            .unwrap_or(&self.id)
    }
}

/// How a lookup arrived at its id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    /// Matched an entity registered in the index
    Indexed,
    /// Minted in extraction mode from a parsed declaration
    Declared,
    /// Synthesized by content or naming classification; may not correspond
    /// to any registered entity
    Inferred,
}

/// Result of minting or resolving an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedId {
    pub id: String,
    pub kind: EntityKind,
    pub confidence: Confidence,
}

impl ResolvedId {
    pub fn inferred(kind: EntityKind, name: &str) -> Self {
        Self {
            id: kind.id_for(name),
            kind,
            confidence: Confidence::Inferred,
        }
    }

    pub fn declared(kind: EntityKind, name: &str) -> Self {
        Self {
            id: kind.id_for(name),
            kind,
            confidence: Confidence::Declared,
        }
    }

    /// Wrap an id taken from the index; the kind is read back from its prefix
    pub fn indexed(id: &str) -> Self {
        let kind = id
            .split_once(':')
            .and_then(|(prefix, _)| EntityKind::from_prefix(prefix))
            .unwrap_or_default();
        Self {
            id: id.to_string(),
            kind,
            confidence: Confidence::Indexed,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.confidence == Confidence::Indexed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_prefixes() {
        assert_eq!(EntityKind::Component.id_for("Button"), "Component:Button");
        assert_eq!(EntityKind::Variable.id_for("PI_APPROX"), "Variable:PI_APPROX");
        assert_eq!(EntityKind::from_prefix("Class"), Some(EntityKind::Class));
        assert_eq!(EntityKind::from_prefix("Widget"), None);
    }

    #[test]
    fn test_indexed_reads_kind_from_prefix() {
        let resolved = ResolvedId::indexed("Class:ApiService");
        assert_eq!(resolved.kind, EntityKind::Class);
        assert!(resolved.is_indexed());
    }

    #[test]
    fn test_entity_serializes_camel_case() {
        let entity = Entity {
            id: "Function:format".to_string(),
            kind: EntityKind::Function,
            file: "src/format.ts".to_string(),
            loc: LineSpan::new(1, 3),
            raw_name: "format".to_string(),
            default_export: false,
            code_hash: String::new(),
        };
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["rawName"], "format");
        assert_eq!(json["loc"]["startLine"], 1);
        assert_eq!(entity.id_name(), "format");
    }
}
