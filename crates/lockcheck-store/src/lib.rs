//! Storage collaborator and project layout for lockcheck.
//!
//! The reconciliation engine never touches the filesystem directly. It reads,
//! writes, lists, and removes documents through the [`DocumentStore`] trait.
//! This crate provides the real filesystem implementation (`FsStore`, with
//! atomic writes), an in-memory implementation for tests and embedding hosts
//! (`MemoryStore`), and `ProjectLayout` for locating the installed manifest
//! and lock directories inside a project.

pub mod fs;
pub mod layout;
pub mod memory;

pub use fs::FsStore;
pub use layout::{
    ProjectLayout, DEFAULT_DISABLED_LOCKS_DIR, DEFAULT_LOCKS_DIR, DEFAULT_MANIFEST_PATH,
};
pub use memory::MemoryStore;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fsync a directory so that a preceding `rename()` is durable.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("invalid file pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),
    #[error("store state poisoned: {0}")]
    Poisoned(String),
}

/// Text storage as seen by the engine.
///
/// Implementations convert every failure of the underlying medium into a
/// [`StoreError`]; nothing panics or unwinds across this boundary.
pub trait DocumentStore: Send + Sync {
    /// Read a whole document. `Ok(None)` means the document does not exist.
    fn read_text(&self, path: &Path) -> Result<Option<String>, StoreError>;

    /// Replace the document at `path`, creating its directory if needed.
    fn write_text(&self, path: &Path, text: &str) -> Result<(), StoreError>;

    /// Files directly inside `dir` whose file name matches the glob
    /// `pattern`, sorted by path.
    fn list_files(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, StoreError>;

    fn remove_file(&self, path: &Path) -> Result<(), StoreError>;

    /// Move a document, replacing any existing document at `to`.
    fn move_file(&self, from: &Path, to: &Path) -> Result<(), StoreError> {
        let text = self
            .read_text(from)?
            .ok_or_else(|| StoreError::FileNotFound(from.to_path_buf()))?;
        self.write_text(to, &text)?;
        self.remove_file(from)
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn read_text(&self, path: &Path) -> Result<Option<String>, StoreError> {
        (**self).read_text(path)
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        (**self).write_text(path, text)
    }

    fn list_files(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, StoreError> {
        (**self).list_files(dir, pattern)
    }

    fn remove_file(&self, path: &Path) -> Result<(), StoreError> {
        (**self).remove_file(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<(), StoreError> {
        (**self).move_file(from, to)
    }
}

/// Match a file name against a glob pattern such as `*.lock.json`.
pub(crate) fn name_matches(pattern: &glob::Pattern, path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| pattern.matches(n))
}
