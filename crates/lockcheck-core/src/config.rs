use lockcheck_store::{ProjectLayout, DEFAULT_LOCKS_DIR, DEFAULT_MANIFEST_PATH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "lockcheck.toml";

/// Packages that are never written into a generated lock file: the resolver
/// itself and the SDK base packages every project already carries.
pub const DEFAULT_EXCLUDED_PACKAGES: &[&str] = &[
    "com.vrchat.core.vpm-resolver",
    "com.vrchat.base",
    "com.vrchat.avatars",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Settings passed explicitly into every engine entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Installed manifest, relative to the project root.
    pub manifest_path: PathBuf,
    /// Directory scanned for lock files, relative to the project root.
    pub locks_dir: PathBuf,
    /// Where `accept` moves lock files. Defaults to `Locks_Disabled` next to
    /// the locks directory.
    pub disabled_locks_dir: Option<PathBuf>,
    /// Glob matched against file names in the locks directory.
    pub lock_pattern: String,
    pub excluded_packages: Vec<String>,
    /// Log every per-package reconciliation step at info level.
    pub debug: bool,
    /// Program and arguments run after a repair. Empty disables it.
    pub resolver_command: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            locks_dir: PathBuf::from(DEFAULT_LOCKS_DIR),
            disabled_locks_dir: None,
            lock_pattern: "*.json".to_owned(),
            excluded_packages: DEFAULT_EXCLUDED_PACKAGES
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            debug: false,
            resolver_command: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn is_excluded(&self, package: &str) -> bool {
        self.excluded_packages.iter().any(|p| p == package)
    }

    pub fn layout(&self, root: impl Into<PathBuf>) -> ProjectLayout {
        let layout = ProjectLayout::new(root)
            .with_manifest(&self.manifest_path)
            .with_locks_dir(&self.locks_dir);
        match &self.disabled_locks_dir {
            Some(dir) => layout.with_disabled_locks_dir(dir),
            None => layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.lock_pattern, "*.json");
        assert!(config.is_excluded("com.vrchat.base"));
        assert!(!config.debug);
    }

    #[test]
    fn partial_config_overrides_fields() {
        let config = EngineConfig::from_toml_str(
            r#"
locks_dir = "Assets/Kit/Locks"
debug = true
excluded_packages = []
resolver_command = ["vpm", "resolve", "project"]
"#,
        )
        .unwrap();
        assert_eq!(config.locks_dir, PathBuf::from("Assets/Kit/Locks"));
        assert!(config.debug);
        assert!(!config.is_excluded("com.vrchat.base"));
        assert_eq!(config.resolver_command.len(), 3);
        assert_eq!(config.manifest_path, PathBuf::from(DEFAULT_MANIFEST_PATH));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(EngineConfig::from_toml_str("lock_dir = \"x\"").is_err());
    }

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = EngineConfig {
            debug: true,
            disabled_locks_dir: Some(PathBuf::from("Old")),
            ..EngineConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn layout_reflects_config() {
        let config = EngineConfig {
            locks_dir: PathBuf::from("Assets/Kit/Locks"),
            ..EngineConfig::default()
        };
        let layout = config.layout("/proj");
        assert_eq!(layout.locks_dir(), PathBuf::from("/proj/Assets/Kit/Locks"));
        assert_eq!(
            layout.disabled_locks_dir(),
            PathBuf::from("/proj/Assets/Kit/Locks_Disabled")
        );
    }
}
