use crate::{name_matches, DocumentStore, StoreError};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

/// In-memory [`DocumentStore`] for deterministic tests and hosts that keep
/// documents outside the filesystem.
///
/// Directories exist once a file has been written into them or they were
/// added with [`MemoryStore::create_dir`].
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            let path = path.into();
            if let Some(parent) = path.parent() {
                state.dirs.insert(parent.to_path_buf());
            }
            state.files.insert(path, text.into());
        }
        self
    }

    #[must_use]
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.dirs.insert(path.into());
        }
        self
    }

    pub fn create_dir(&self, path: impl Into<PathBuf>) -> Result<(), StoreError> {
        self.lock()?.dirs.insert(path.into());
        Ok(())
    }

    /// Number of successful [`DocumentStore::write_text`] calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().is_ok_and(|s| s.files.contains_key(path))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn read_text(&self, path: &Path) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.files.get(path).cloned())
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if let Some(parent) = path.parent() {
            state.dirs.insert(parent.to_path_buf());
        }
        state.files.insert(path.to_path_buf(), text.to_owned());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn list_files(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, StoreError> {
        let pattern = glob::Pattern::new(pattern)?;
        let state = self.lock()?;
        if !state.dirs.contains(dir) {
            return Err(StoreError::DirectoryNotFound(dir.to_path_buf()));
        }
        // BTreeMap iteration is already sorted by path.
        Ok(state
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir) && name_matches(&pattern, p))
            .cloned()
            .collect())
    }

    fn remove_file(&self, path: &Path) -> Result<(), StoreError> {
        self.lock()?
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::FileNotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_files_are_readable() {
        let store = MemoryStore::new().with_file("Packages/vpm-manifest.json", "{}");
        assert_eq!(
            store
                .read_text(Path::new("Packages/vpm-manifest.json"))
                .unwrap()
                .as_deref(),
            Some("{}")
        );
        assert_eq!(store.read_text(Path::new("other.json")).unwrap(), None);
    }

    #[test]
    fn listing_requires_directory() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.list_files(Path::new("Locks"), "*.json"),
            Err(StoreError::DirectoryNotFound(_))
        ));
        let store = store.with_dir("Locks");
        assert!(store.list_files(Path::new("Locks"), "*.json").unwrap().is_empty());
    }

    #[test]
    fn listing_is_direct_children_only() {
        let store = MemoryStore::new()
            .with_file("Locks/b.lock.json", "{}")
            .with_file("Locks/a.lock.json", "{}")
            .with_file("Locks/readme.md", "")
            .with_file("Locks/old/c.lock.json", "{}");
        let files = store.list_files(Path::new("Locks"), "*.json").unwrap();
        assert_eq!(
            files,
            [
                PathBuf::from("Locks/a.lock.json"),
                PathBuf::from("Locks/b.lock.json")
            ]
        );
    }

    #[test]
    fn counts_writes() {
        let store = MemoryStore::new().with_file("seed.json", "{}");
        assert_eq!(store.write_count(), 0);
        store.write_text(Path::new("x.json"), "1").unwrap();
        store.write_text(Path::new("x.json"), "2").unwrap();
        assert_eq!(store.write_count(), 2);
        assert!(store.contains(Path::new("x.json")));
    }

    #[test]
    fn remove_missing_file_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.remove_file(Path::new("x.json")),
            Err(StoreError::FileNotFound(_))
        ));
    }
}
