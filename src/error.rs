//! Error types for entity extraction and resolution
//!
//! None of these errors escape the public contract operations: `extract`,
//! `generate_id` and `generate_id_by_lookup` log them and degrade to a
//! best-effort default. They exist so the internal pipeline can use `?`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for entity-resolver operations
#[derive(Error, Debug)]
pub enum EntityError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported language for extension: {extension}")]
    UnsupportedLanguage { extension: String },

    #[error("Failed to parse file: {message}")]
    ParseFailure { message: String },

    #[error("Invalid package manifest {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EntityError {
    /// Whether the error means the file simply is not there (as opposed to
    /// being present but unusable)
    pub fn is_missing_file(&self) -> bool {
        match self {
            Self::FileNotFound { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type alias for entity-resolver operations
pub type Result<T> = std::result::Result<T, EntityError>;
