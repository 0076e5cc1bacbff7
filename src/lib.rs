//! Entity Resolver: stable entity ids for TS/JS/Vue workspaces
//!
//! Gives every top-level exported declaration of a front-end workspace a
//! canonical id of the form `"<Kind>:<Name>"` (`Component:Button`,
//! `Function:formatDate`, `Variable:API_URL`, `Class:ApiService`), and maps an
//! import site (`import X from './path'`) back to the id of the entity it
//! refers to. Downstream tools use these ids as join keys across files.
//!
//! # Supported Languages
//!
//! - TypeScript, TSX, JavaScript, JSX (tree-sitter)
//! - Vue Single File Components (the `<script>` block)
//!
//! # Example
//!
//! ```ignore
//! use entity_resolver::{EngineConfig, EntityEngine};
//! use std::path::Path;
//!
//! let engine = EntityEngine::new(EngineConfig::from_env());
//! let root = Path::new("/work/app");
//!
//! let entities = engine.extract_all(&["src/widgets/Button.tsx", "src/api/index.ts"], root);
//! engine.init_entity_map(&entities);
//!
//! let id = engine.generate_id_by_lookup(Path::new("src/widgets/Button.tsx"), "Button", true, root);
//! assert_eq!(id, "Component:Button");
//! ```

pub mod config;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod fs;
pub mod lang;
pub mod logging;
pub mod resolver;
pub mod schema;
pub mod source_cache;

// Re-export commonly used types
pub use config::{CacheConfig, EngineConfig, LoggingConfig, ResolveConfig};
pub use detectors::declaration::{collect_declarations, Declaration};
pub use detectors::ExtractorKind;
pub use engine::EntityEngine;
pub use error::{EntityError, Result};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use lang::Lang;
pub use logging::init_tracing;
pub use resolver::{EntityResolver, ResolverStats};
pub use schema::{Confidence, Entity, EntityKind, LineSpan, ResolvedId};
pub use source_cache::{ParsedSource, SourceCache, SourceCacheStats};
