use crate::{fsync_dir, name_matches, DocumentStore, StoreError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// [`DocumentStore`] backed by the local filesystem.
///
/// Writes go to a temporary file in the destination directory which is
/// fsynced and then renamed over the target, so readers never observe a
/// partially written manifest. A replaced file keeps its permissions; a new
/// one is created `0644` on unix.
///
/// Reads drop a leading UTF-8 byte order mark.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

const UTF8_BOM: char = '\u{feff}';

/// Permissions for the replacement file: the target's own when it exists.
fn target_permissions(path: &Path) -> Option<fs::Permissions> {
    match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

impl DocumentStore for FsStore {
    fn read_text(&self, path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path) {
            Ok(text) => match text.strip_prefix(UTF8_BOM) {
                Some(rest) => Ok(Some(rest.to_owned())),
                None => Ok(Some(text)),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no document at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        let dir = parent_dir(path);
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(text.as_bytes())?;
        if let Some(perms) = target_permissions(path) {
            tmp.as_file().set_permissions(perms)?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(&dir)?;
        debug!("wrote {} bytes to {}", text.len(), path.display());
        Ok(())
    }

    fn list_files(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, StoreError> {
        let pattern = glob::Pattern::new(pattern)?;
        if !dir.is_dir() {
            return Err(StoreError::DirectoryNotFound(dir.to_path_buf()));
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && name_matches(&pattern, &path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn remove_file(&self, path: &Path) -> Result<(), StoreError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::FileNotFound(path.to_path_buf()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<(), StoreError> {
        if !from.is_file() {
            return Err(StoreError::FileNotFound(from.to_path_buf()));
        }
        let dir = parent_dir(to);
        fs::create_dir_all(&dir)?;
        fs::rename(from, to)?;
        fsync_dir(&dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new();
        assert_eq!(store.read_text(&dir.path().join("absent.json")).unwrap(), None);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new();
        let path = dir.path().join("Packages").join("vpm-manifest.json");
        store.write_text(&path, "{\"locked\": {}}").unwrap();
        assert_eq!(
            store.read_text(&path).unwrap().as_deref(),
            Some("{\"locked\": {}}")
        );
    }

    #[test]
    fn write_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new();
        let path = dir.path().join("doc.json");
        store.write_text(&path, "first").unwrap();
        store.write_text(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        // No stray temp files left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn read_strips_byte_order_mark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kit.lock.json");
        fs::write(&path, "\u{feff}{\"locked\": {}}").unwrap();
        assert_eq!(
            FsStore::new().read_text(&path).unwrap().as_deref(),
            Some("{\"locked\": {}}")
        );
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vpm-manifest.json");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        FsStore::new().write_text(&path, "new").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o664)).unwrap();
        FsStore::new().write_text(&path, "newer").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o664);
    }

    #[cfg(unix)]
    #[test]
    fn new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Locks").join("Ann_Hat.lock.json");
        FsStore::new().write_text(&path, "{}").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn list_is_top_level_filtered_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.lock.json"), "{}").unwrap();
        fs::write(dir.path().join("a.lock.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.lock.json"), "{}").unwrap();

        let files = FsStore::new().list_files(dir.path(), "*.json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.lock.json", "b.lock.json"]);
    }

    #[test]
    fn list_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsStore::new()
            .list_files(&dir.path().join("Locks"), "*.json")
            .unwrap_err();
        assert!(matches!(err, StoreError::DirectoryNotFound(_)));
    }

    #[test]
    fn remove_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsStore::new()
            .remove_file(&dir.path().join("gone.json"))
            .unwrap_err();
        assert!(matches!(err, StoreError::FileNotFound(_)));
    }

    #[test]
    fn move_creates_destination_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new();
        let src = dir.path().join("Locks").join("a.lock.json");
        let dst = dir.path().join("Locks_Disabled").join("a.lock.json");
        store.write_text(&src, "new").unwrap();
        store.write_text(&dst, "old").unwrap();

        store.move_file(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "new");
    }
}
