use crate::merge::MergedRequirements;
use lockcheck_schema::{parse_manifest_str, ManifestDocument, ManifestError, PackageId, VersionString};
use serde::Serialize;
use thiserror::Error;

/// Why a diff could not be computed. Distinct from an empty issue list.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("installed manifest has no 'locked' package map")]
    MissingPackageMap,
    #[error("installed package '{0}' has a null record")]
    InvalidRecord(String),
    #[error("{0}")]
    Parse(#[from] ManifestError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Missing,
    Mismatch,
}

/// A required package that is missing from, or installed at a different
/// version than, the installed manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub package: PackageId,
    pub expected_version: VersionString,
    /// `None` when the package is not installed at all.
    pub actual_version: Option<VersionString>,
}

impl Issue {
    pub fn missing(package: impl Into<PackageId>, expected: impl Into<VersionString>) -> Self {
        Self {
            package: package.into(),
            expected_version: expected.into(),
            actual_version: None,
        }
    }

    pub fn mismatch(
        package: impl Into<PackageId>,
        expected: impl Into<VersionString>,
        actual: impl Into<VersionString>,
    ) -> Self {
        Self {
            package: package.into(),
            expected_version: expected.into(),
            actual_version: Some(actual.into()),
        }
    }

    pub fn kind(&self) -> IssueKind {
        if self.actual_version.is_some() {
            IssueKind::Mismatch
        } else {
            IssueKind::Missing
        }
    }
}

/// Compare merged requirements against the installed manifest.
///
/// Versions are compared as literal strings, so `1.0` and `1.0.0` differ.
/// Installed packages that nothing requires are never reported. Issues come
/// out in requirement order.
pub fn diff_requirements(
    requirements: &MergedRequirements,
    installed: &ManifestDocument,
) -> Result<Vec<Issue>, DiffError> {
    let packages = installed.packages().ok_or(DiffError::MissingPackageMap)?;

    let mut issues = Vec::new();
    for (package, expected) in requirements.iter() {
        if !packages.contains_key(package) {
            issues.push(Issue::missing(package.clone(), expected.clone()));
            continue;
        }
        let record = packages
            .get(package)
            .ok_or_else(|| DiffError::InvalidRecord(package.to_string()))?;
        let actual = record.version.as_deref().unwrap_or_default();
        if actual != expected.as_str() {
            issues.push(Issue::mismatch(package.clone(), expected.clone(), actual));
        }
    }
    Ok(issues)
}

/// Parse `installed` without validating it, then diff.
pub fn diff_against_text(
    requirements: &MergedRequirements,
    installed: &str,
) -> Result<Vec<Issue>, DiffError> {
    let doc = parse_manifest_str(installed)?;
    diff_requirements(requirements, &doc)
}
