//! Reconciliation engine for lockcheck.
//!
//! This crate ties the schema and storage layers together into the `Engine`,
//! the central API for checking an installed manifest against every lock file
//! in a project, generating new lock files from a package selection, and
//! repairing the installed manifest. The individual steps (merging lock sets,
//! diffing, composing, patching) are exposed as plain functions so hosts can
//! run them on documents they obtained elsewhere.

pub mod compose;
pub mod config;
pub mod diff;
pub mod engine;
pub mod merge;
pub mod patch;
pub mod resolver;

pub use compose::{compose_lock, Selection};
pub use config::{ConfigError, EngineConfig, CONFIG_FILE_NAME};
pub use diff::{diff_against_text, diff_requirements, DiffError, Issue, IssueKind};
pub use engine::{
    AcceptReport, CheckReport, Engine, GeneratedLock, RepairOutcome, ResolverOutcome, SkippedLock,
};
pub use merge::{merge_requirements, MergedRequirements};
pub use patch::{patch_manifest, PatchError};
pub use resolver::{
    resolver_from_config, CommandResolver, ExternalResolver, MockResolver, ResolverError,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] lockcheck_schema::ManifestError),
    #[error("lock error: {0}")]
    Lock(#[from] lockcheck_schema::LockError),
    #[error("store error: {0}")]
    Store(#[from] lockcheck_store::StoreError),
    #[error("cannot compare: {0}")]
    Diff(#[from] DiffError),
    #[error("manifest error: cannot patch: {0}")]
    Patch(#[from] PatchError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("required input not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("no packages selected for the lock file")]
    EmptySelection,
}
