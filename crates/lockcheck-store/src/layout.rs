use std::path::{Path, PathBuf};

/// Installed manifest location relative to the project root.
pub const DEFAULT_MANIFEST_PATH: &str = "Packages/vpm-manifest.json";
/// Directory holding author-supplied lock files.
pub const DEFAULT_LOCKS_DIR: &str = "Locks";
/// Name of the directory lock files are moved to when current versions are
/// accepted. Lives next to the locks directory unless configured otherwise.
pub const DEFAULT_DISABLED_LOCKS_DIR: &str = "Locks_Disabled";

/// Locations of the documents a reconciliation run touches.
///
/// Relative paths are resolved against the project root; absolute paths are
/// used as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    manifest: PathBuf,
    locks: PathBuf,
    disabled_locks: Option<PathBuf>,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: PathBuf::from(DEFAULT_MANIFEST_PATH),
            locks: PathBuf::from(DEFAULT_LOCKS_DIR),
            disabled_locks: None,
        }
    }

    #[must_use]
    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = path.into();
        self
    }

    #[must_use]
    pub fn with_locks_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.locks = path.into();
        self
    }

    #[must_use]
    pub fn with_disabled_locks_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.disabled_locks = Some(path.into());
        self
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.manifest)
    }

    #[inline]
    pub fn locks_dir(&self) -> PathBuf {
        self.root.join(&self.locks)
    }

    pub fn disabled_locks_dir(&self) -> PathBuf {
        if let Some(dir) = &self.disabled_locks {
            return self.root.join(dir);
        }
        let locks = self.locks_dir();
        match locks.parent() {
            Some(parent) => parent.join(DEFAULT_DISABLED_LOCKS_DIR),
            None => self.root.join(DEFAULT_DISABLED_LOCKS_DIR),
        }
    }

    #[inline]
    pub fn lock_path(&self, file_name: &str) -> PathBuf {
        self.locks_dir().join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths() {
        let layout = ProjectLayout::new("/tmp/project");
        assert_eq!(
            layout.manifest_path(),
            PathBuf::from("/tmp/project/Packages/vpm-manifest.json")
        );
        assert_eq!(layout.locks_dir(), PathBuf::from("/tmp/project/Locks"));
        assert_eq!(
            layout.disabled_locks_dir(),
            PathBuf::from("/tmp/project/Locks_Disabled")
        );
        assert_eq!(
            layout.lock_path("a_b.lock.json"),
            PathBuf::from("/tmp/project/Locks/a_b.lock.json")
        );
    }

    #[test]
    fn disabled_dir_follows_nested_locks_dir() {
        let layout =
            ProjectLayout::new("/tmp/project").with_locks_dir("Assets/Checker/Locks");
        assert_eq!(
            layout.disabled_locks_dir(),
            PathBuf::from("/tmp/project/Assets/Checker/Locks_Disabled")
        );
    }

    #[test]
    fn explicit_paths_override_defaults() {
        let layout = ProjectLayout::new("/p")
            .with_manifest("manifest.json")
            .with_locks_dir("/abs/locks")
            .with_disabled_locks_dir("off");
        assert_eq!(layout.manifest_path(), PathBuf::from("/p/manifest.json"));
        assert_eq!(layout.locks_dir(), PathBuf::from("/abs/locks"));
        assert_eq!(layout.disabled_locks_dir(), PathBuf::from("/p/off"));
    }
}
