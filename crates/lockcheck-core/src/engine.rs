use crate::compose::{compose_lock, Selection};
use crate::config::EngineConfig;
use crate::diff::{diff_requirements, Issue};
use crate::merge::{merge_requirements, MergedRequirements};
use crate::patch::patch_manifest;
use crate::resolver::ExternalResolver;
use crate::CoreError;
use lockcheck_schema::{
    is_lock_file, is_version_greater, lock_file_name, parse_and_validate, parse_manifest_str,
    LockDocument, ManifestDocument, PackageMap,
};
use lockcheck_store::{DocumentStore, ProjectLayout, StoreError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Per-package detail, promoted to info level when `debug` is configured.
macro_rules! detail {
    ($config:expr, $($arg:tt)+) => {
        if $config.debug {
            info!($($arg)+);
        } else {
            debug!($($arg)+);
        }
    };
}

/// Reconciles a project's installed manifest against its lock files.
///
/// Every read and write goes through the [`DocumentStore`]; the engine keeps
/// no state between calls.
pub struct Engine<S: DocumentStore> {
    store: S,
    layout: ProjectLayout,
    config: EngineConfig,
}

/// A lock file that was listed but not merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLock {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub manifest: PathBuf,
    pub lock_files: Vec<PathBuf>,
    pub skipped: Vec<SkippedLock>,
    pub requirements: MergedRequirements,
    pub issues: Vec<Issue>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedLock {
    pub path: PathBuf,
    pub package_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolverOutcome {
    /// Nothing was patched, so nothing needed resolving.
    Skipped,
    NotConfigured,
    Triggered { name: String },
    Failed { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairOutcome {
    pub manifest: PathBuf,
    /// Number of issues written into the manifest.
    pub patched: usize,
    pub resolver: ResolverOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AcceptReport {
    pub disabled_dir: PathBuf,
    pub moved: Vec<PathBuf>,
    pub failed: Vec<SkippedLock>,
}

struct LockSets {
    files: Vec<PathBuf>,
    documents: Vec<ManifestDocument>,
    skipped: Vec<SkippedLock>,
}

impl<S: DocumentStore> Engine<S> {
    pub fn new(store: S, layout: ProjectLayout, config: EngineConfig) -> Self {
        Self {
            store,
            layout,
            config,
        }
    }

    /// Engine for the project at `root`, laid out as `config` describes.
    pub fn from_config(store: S, root: impl Into<PathBuf>, config: EngineConfig) -> Self {
        let layout = config.layout(root);
        Self::new(store, layout, config)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The installed package map, unvalidated. A manifest without a
    /// `locked` field yields an empty map.
    pub fn installed_packages(&self) -> Result<PackageMap, CoreError> {
        let text = self.read_manifest()?;
        let doc = parse_manifest_str(&text)?;
        Ok(doc.locked.unwrap_or_default())
    }

    /// Merge every usable lock file without looking at the installed manifest.
    pub fn requirements(&self) -> Result<MergedRequirements, CoreError> {
        let sets = self.load_lock_sets()?;
        Ok(merge_requirements(&sets.documents, is_version_greater))
    }

    /// Validate the installed manifest, merge all lock files and diff.
    pub fn check(&self) -> Result<CheckReport, CoreError> {
        let manifest_path = self.layout.manifest_path();
        let installed = parse_and_validate(&self.read_manifest()?)?;

        let sets = self.load_lock_sets()?;
        let requirements = merge_requirements(&sets.documents, is_version_greater);
        let issues = diff_requirements(&requirements, &installed)?;

        for issue in &issues {
            match &issue.actual_version {
                Some(actual) => detail!(
                    self.config,
                    "{}: installed {actual}, required {}",
                    issue.package,
                    issue.expected_version
                ),
                None => detail!(
                    self.config,
                    "{}: not installed, required {}",
                    issue.package,
                    issue.expected_version
                ),
            }
        }
        info!(
            "checked {} lock file(s), {} requirement(s): {} issue(s)",
            sets.files.len(),
            requirements.len(),
            issues.len()
        );

        Ok(CheckReport {
            manifest: manifest_path,
            lock_files: sets.files,
            skipped: sets.skipped,
            requirements,
            issues,
        })
    }

    /// Write a lock file for `author`/`asset` holding the selected installed
    /// packages. Excluded packages are dropped from the selection first.
    pub fn generate_lock(
        &self,
        author: &str,
        asset: &str,
        selection: &Selection,
    ) -> Result<GeneratedLock, CoreError> {
        let file_name = lock_file_name(author, asset)?;
        let installed = self.installed_packages()?;

        let mut selection = selection.clone();
        for excluded in &self.config.excluded_packages {
            selection.deselect(excluded.as_str());
        }

        let packages = compose_lock(Some(&installed), &selection);
        if packages.is_empty() {
            return Err(CoreError::EmptySelection);
        }
        for (id, record) in packages.iter() {
            detail!(
                self.config,
                "locking {id} at {}",
                record.and_then(|r| r.version()).unwrap_or("?")
            );
        }

        let lock = LockDocument::from_packages(packages);
        let text = lock.to_json_pretty()?;
        let path = self.layout.lock_path(&file_name);
        self.store.write_text(&path, &text)?;
        info!(
            "wrote {} with {} package(s)",
            path.display(),
            lock.package_count()
        );

        Ok(GeneratedLock {
            path,
            package_count: lock.package_count(),
        })
    }

    /// Patch the installed manifest with `issues` and then run `resolver`.
    ///
    /// The manifest is written only after the whole patch succeeded. A
    /// resolver failure is reported in the outcome because the manifest has
    /// already changed by then.
    pub fn repair(
        &self,
        issues: &[Issue],
        resolver: Option<&dyn ExternalResolver>,
    ) -> Result<RepairOutcome, CoreError> {
        let manifest = self.layout.manifest_path();
        if issues.is_empty() {
            debug!("nothing to repair");
            return Ok(RepairOutcome {
                manifest,
                patched: 0,
                resolver: ResolverOutcome::Skipped,
            });
        }

        let text = self.read_manifest()?;
        let patched = patch_manifest(&text, issues)?;
        self.store.write_text(&manifest, &patched)?;
        info!("updated {} ({} change(s))", manifest.display(), issues.len());

        let resolver = match resolver {
            None => ResolverOutcome::NotConfigured,
            Some(r) => match r.trigger() {
                Ok(()) => {
                    info!("resolver '{}' triggered", r.name());
                    ResolverOutcome::Triggered {
                        name: r.name().to_owned(),
                    }
                }
                Err(e) => {
                    warn!("resolver '{}' failed: {e}", r.name());
                    ResolverOutcome::Failed {
                        name: r.name().to_owned(),
                        reason: e.to_string(),
                    }
                }
            },
        };

        Ok(RepairOutcome {
            manifest,
            patched: issues.len(),
            resolver,
        })
    }

    /// Accept the installed versions by moving every lock file into the
    /// disabled locks directory, replacing same-named files there. A
    /// `<name>.meta` sidecar next to a lock file moves with it.
    ///
    /// A missing locks directory means there is nothing to accept.
    pub fn accept_current(&self) -> Result<AcceptReport, CoreError> {
        let locks_dir = self.layout.locks_dir();
        let disabled_dir = self.layout.disabled_locks_dir();
        let files = match self.store.list_files(&locks_dir, &self.config.lock_pattern) {
            Ok(files) => files,
            Err(StoreError::DirectoryNotFound(_)) => {
                debug!("no locks directory at {}", locks_dir.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut report = AcceptReport {
            disabled_dir: disabled_dir.clone(),
            ..AcceptReport::default()
        };
        for path in files.into_iter().filter(|p| is_lock_file(p)) {
            let Some(name) = path.file_name() else {
                continue;
            };
            let target = disabled_dir.join(name);
            match self.store.move_file(&path, &target) {
                Ok(()) => {
                    detail!(self.config, "disabled {}", path.display());
                    self.move_sidecar(&path, &target);
                    report.moved.push(path);
                }
                Err(e) => {
                    warn!("failed to disable {}: {e}", path.display());
                    report.failed.push(SkippedLock {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            "accepted current versions: {} lock file(s) disabled",
            report.moved.len()
        );
        Ok(report)
    }

    fn move_sidecar(&self, lock: &Path, target: &Path) {
        let from = sidecar_path(lock);
        match self.store.read_text(&from) {
            Ok(Some(_)) => {}
            Ok(None) => return,
            Err(e) => {
                warn!("failed to read {}: {e}", from.display());
                return;
            }
        }
        let to = sidecar_path(target);
        match self.store.move_file(&from, &to) {
            Ok(()) => detail!(self.config, "disabled {}", from.display()),
            Err(e) => warn!("failed to disable {}: {e}", from.display()),
        }
    }

    fn read_manifest(&self) -> Result<String, CoreError> {
        let path = self.layout.manifest_path();
        self.store
            .read_text(&path)?
            .ok_or(CoreError::MissingInput(path))
    }

    fn load_lock_sets(&self) -> Result<LockSets, CoreError> {
        let locks_dir = self.layout.locks_dir();
        let files = match self.store.list_files(&locks_dir, &self.config.lock_pattern) {
            Ok(files) => files,
            Err(StoreError::DirectoryNotFound(dir)) => return Err(CoreError::MissingInput(dir)),
            Err(e) => return Err(e.into()),
        };

        let mut sets = LockSets {
            files: Vec::with_capacity(files.len()),
            documents: Vec::with_capacity(files.len()),
            skipped: Vec::new(),
        };
        for path in files {
            match self.load_lock(&path) {
                Ok(doc) => {
                    detail!(
                        self.config,
                        "{}: {} package(s)",
                        path.display(),
                        doc.packages().map_or(0, PackageMap::len)
                    );
                    sets.documents.push(doc);
                    sets.files.push(path);
                }
                Err(reason) => {
                    warn!("skipping lock file {}: {reason}", path.display());
                    sets.skipped.push(SkippedLock { path, reason });
                }
            }
        }
        Ok(sets)
    }

    fn load_lock(&self, path: &Path) -> Result<ManifestDocument, String> {
        let text = self
            .store
            .read_text(path)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "file disappeared before it could be read".to_owned())?;
        parse_and_validate(&text).map_err(|e| e.to_string())
    }
}

fn sidecar_path(lock: &Path) -> PathBuf {
    let mut name = lock.as_os_str().to_owned();
    name.push(".meta");
    PathBuf::from(name)
}
