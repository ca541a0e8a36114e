use crate::manifest::{ManifestDocument, PackageMap};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// File name suffix of author-supplied lock files.
pub const LOCK_FILE_SUFFIX: &str = ".lock.json";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock file name part '{0}' must not be empty")]
    BlankNamePart(&'static str),
    #[error("lock file name part '{part}' contains a path separator: '{value}'")]
    InvalidNamePart { part: &'static str, value: String },
    #[error("lock file serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A requirement set composed from an installed manifest, ready to be
/// written as a lock file.
///
/// Serializes to the same shape lock files are read in:
/// `{"locked": {"<package>": {"version": "..."}}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockDocument {
    pub locked: PackageMap,
}

impl LockDocument {
    pub fn from_packages(locked: PackageMap) -> Self {
        Self { locked }
    }

    pub fn package_count(&self) -> usize {
        self.locked.len()
    }

    /// Two-space indented JSON, the format lock files are distributed in.
    pub fn to_json_pretty(&self) -> Result<String, LockError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn into_manifest(self) -> ManifestDocument {
        ManifestDocument::from_packages(self.locked)
    }
}

/// `"{author}_{asset}.lock.json"`.
pub fn lock_file_name(author: &str, asset: &str) -> Result<String, LockError> {
    let author = check_name_part("author", author)?;
    let asset = check_name_part("asset", asset)?;
    Ok(format!("{author}_{asset}{LOCK_FILE_SUFFIX}"))
}

fn check_name_part<'a>(part: &'static str, value: &'a str) -> Result<&'a str, LockError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LockError::BlankNamePart(part));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(LockError::InvalidNamePart {
            part,
            value: value.to_owned(),
        });
    }
    Ok(trimmed)
}

pub fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(LOCK_FILE_SUFFIX))
}
