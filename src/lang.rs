//! Language detection and tree-sitter grammar loading

use std::path::Path;
use tree_sitter::Language;

use crate::error::{EntityError, Result};

/// Source formats the extractors understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
    /// Vue Single File Component (.vue)
    Vue,
}

impl Lang {
    /// Detect language from file path extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| EntityError::UnsupportedLanguage {
                extension: "none".to_string(),
            })?;

        Self::from_extension(ext)
    }

    /// Detect language from file extension string
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "ts" | "mts" | "cts" => Ok(Self::TypeScript),
            "tsx" => Ok(Self::Tsx),
            "js" | "mjs" | "cjs" => Ok(Self::JavaScript),
            "jsx" => Ok(Self::Jsx),
            "vue" => Ok(Self::Vue),
            _ => Err(EntityError::UnsupportedLanguage {
                extension: ext.to_string(),
            }),
        }
    }

    /// Get the canonical name of the language
    pub fn name(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
            Self::Vue => "vue",
        }
    }

    /// Get the tree-sitter Language for parsing
    ///
    /// Vue has no grammar of its own here: the `<script>` block is cut out
    /// and parsed with the grammar of its `lang` attribute.
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::JavaScript | Self::Jsx | Self::Vue => tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    /// Whether declarations in this file may construct UI markup (JSX or a
    /// component template)
    pub fn is_markup_context(&self) -> bool {
        matches!(self, Self::Tsx | Self::Jsx | Self::Vue)
    }

    /// Check if this is a dedicated single-file-component format
    pub fn is_single_file_component(&self) -> bool {
        matches!(self, Self::Vue)
    }
}

/// Whether the path carries the single-file-component extension
pub fn is_sfc_path(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".vue")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_language_detection() {
        assert_eq!(Lang::from_extension("ts").unwrap(), Lang::TypeScript);
        assert_eq!(Lang::from_extension("mts").unwrap(), Lang::TypeScript);
        assert_eq!(Lang::from_extension("tsx").unwrap(), Lang::Tsx);
        assert_eq!(Lang::from_extension("js").unwrap(), Lang::JavaScript);
        assert_eq!(Lang::from_extension("jsx").unwrap(), Lang::Jsx);
        assert_eq!(Lang::from_extension("vue").unwrap(), Lang::Vue);
        assert_eq!(Lang::from_extension("TSX").unwrap(), Lang::Tsx);
    }

    #[test]
    fn test_language_from_path() {
        let path = PathBuf::from("src/components/App.tsx");
        assert_eq!(Lang::from_path(&path).unwrap(), Lang::Tsx);

        let path = PathBuf::from("src/widgets");
        assert!(Lang::from_path(&path).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(Lang::from_extension("rs").is_err());
        assert!(Lang::from_extension("json").is_err());
    }

    #[test]
    fn test_markup_context() {
        assert!(Lang::Tsx.is_markup_context());
        assert!(Lang::Jsx.is_markup_context());
        assert!(Lang::Vue.is_markup_context());
        assert!(!Lang::TypeScript.is_markup_context());
        assert!(!Lang::JavaScript.is_markup_context());
    }

    #[test]
    fn test_vue_sfc() {
        assert!(Lang::Vue.is_single_file_component());
        assert!(!Lang::Tsx.is_single_file_component());
        assert!(is_sfc_path("src/components/HelloWorld.vue"));
        assert!(!is_sfc_path("src/components/HelloWorld.tsx"));
    }
}
