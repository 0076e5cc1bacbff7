//! Filesystem access and workspace path helpers
//!
//! All file reads and stats go through the [`FileSystem`] trait so the
//! caches and entry-file resolution can run against the real disk or an
//! in-memory workspace.
//!
//! Workspace-relative paths are always `/`-separated strings; that is the
//! form stored in [`Entity::file`](crate::schema::Entity) and used as the key
//! of every path-keyed cache.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use serde::Deserialize;

use crate::error::{EntityError, Result};

/// Read/stat capability backing the source cache and entry-file resolution
pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Last modification time
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;
}

/// The real filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// In-memory workspace; every write bumps a logical clock used as mtime
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<BTreeMap<PathBuf, (String, SystemTime)>>,
    clock: RwLock<u64>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a file
    pub fn write(&self, path: impl Into<PathBuf>, content: &str) {
        let mut clock = self.clock.write();
        *clock += 1;
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(*clock);
        self.files
            .write()
            .insert(path.into(), (content.to_string(), mtime));
    }

    pub fn remove(&self, path: &Path) {
        self.files.write().remove(path);
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .read()
            .get(path)
            .map(|(content, _)| content.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        self.files
            .read()
            .get(path)
            .map(|(_, mtime)| *mtime)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .read()
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

// ============================================================================
// Path helpers
// ============================================================================

/// Resolve `.` and `..` components without touching the disk
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Absolute form of `path`: relative paths are taken relative to `root`
pub fn absolute_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&root.join(path))
    }
}

/// Workspace-relative, `/`-separated form of `path`
///
/// Paths outside `root` keep their full (normalized) form.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let absolute = absolute_path(root, path);
    let root = normalize_lexically(root);
    let relative = absolute.strip_prefix(&root).unwrap_or(&absolute);
    to_slash(relative)
}

/// Join path components with `/`
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// File name without its extension (`src/widgets/Button.tsx` -> `Button`)
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// Name of the directory containing `path`, if any
pub fn parent_dir_name(path: &str) -> Option<&str> {
    let (parent, _) = path.rsplit_once('/')?;
    parent.rsplit('/').next().filter(|s| !s.is_empty())
}

/// Whether the file is a directory entry file (its stem matches one of the
/// configured entry filenames, e.g. `index`)
pub fn is_entry_file(path: &str, entry_files: &[String]) -> bool {
    let stem = file_stem(path);
    entry_files.iter().any(|entry| file_stem(entry) == stem)
}

/// Base name a file is known by when imported as a module
///
/// This is the file stem, except for entry files, which are known by their
/// directory's name (`src/services/index.ts` -> `services`).
pub fn module_name(path: &str, entry_files: &[String]) -> String {
    if is_entry_file(path, entry_files) {
        if let Some(dir) = parent_dir_name(path) {
            return dir.to_string();
        }
    }
    file_stem(path).to_string()
}

// ============================================================================
// Entry-file resolution
// ============================================================================

#[derive(Debug, Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Find the file a directory resolves to when imported directly
///
/// Tries the configured entry filenames in order, then the `main` field of
/// the directory's `package.json`.
pub fn find_entry_file(
    fs: &dyn FileSystem,
    dir: &Path,
    entry_files: &[String],
) -> Result<Option<PathBuf>> {
    for entry in entry_files {
        let candidate = dir.join(entry);
        if fs.is_file(&candidate) {
            return Ok(Some(candidate));
        }
    }

    let manifest_path = dir.join("package.json");
    if !fs.is_file(&manifest_path) {
        return Ok(None);
    }

    let text = fs.read_to_string(&manifest_path)?;
    let manifest: PackageManifest =
        serde_json::from_str(&text).map_err(|e| EntityError::InvalidManifest {
            path: manifest_path.clone(),
            message: e.to_string(),
        })?;

    Ok(manifest
        .main
        .map(|main| normalize_lexically(&dir.join(main)))
        .filter(|main| fs.is_file(main)))
}

/// [`find_entry_file`] for callers that degrade instead of failing
pub fn resolve_entry_file(fs: &dyn FileSystem, dir: &Path, entry_files: &[String]) -> Option<PathBuf> {
    match find_entry_file(fs, dir, entry_files) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!("[RESOLVE] Ignoring entry resolution for {}: {}", dir.display(), e);
            None
        }
    }
}
