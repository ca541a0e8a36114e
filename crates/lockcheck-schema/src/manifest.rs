use crate::types::PackageId;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Name of the top-level field holding the package map in installed
/// manifests and lock documents.
pub const PACKAGE_MAP_FIELD: &str = "locked";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid manifest: {0}")]
    Invalid(#[from] ValidationError),
}

/// Reason a document failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("document is null")]
    NullDocument,
    #[error("'locked' field is missing or null")]
    MissingPackageMap,
    #[error("'locked' field is empty")]
    EmptyPackageMap,
    #[error("package key is empty or whitespace")]
    BlankPackageId,
    #[error("package '{0}' has a null record")]
    NullRecord(String),
    #[error("package '{0}' has an empty or whitespace version")]
    BlankVersion(String),
}

/// A single package entry. Only `version` is interpreted; every other field
/// is carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageRecord {
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            extra: Map::new(),
        }
    }

    /// The version, unless it is absent or blank.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.trim().is_empty())
    }
}

/// Package map in document order.
///
/// A record may be `None` when the document holds `null` for that key; such
/// documents never pass [`validate`]. A key that appears twice keeps its first
/// position and takes the later value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageMap {
    entries: Vec<(PackageId, Option<PackageRecord>)>,
    index: HashMap<PackageId, usize>,
}

impl PackageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<PackageId>, record: Option<PackageRecord>) {
        let id = id.into();
        match self.index.get(&id) {
            Some(&i) => self.entries[i].1 = record,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, record));
            }
        }
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// The record for `id`, or `None` when the key is absent or null.
    pub fn get(&self, id: &str) -> Option<&PackageRecord> {
        self.index.get(id).and_then(|&i| self.entries[i].1.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageId, Option<&PackageRecord>)> {
        self.entries.iter().map(|(k, r)| (k, r.as_ref()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &PackageId> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(PackageId, PackageRecord)> for PackageMap {
    fn from_iter<I: IntoIterator<Item = (PackageId, PackageRecord)>>(iter: I) -> Self {
        let mut map = PackageMap::new();
        for (id, record) in iter {
            map.insert(id, Some(record));
        }
        map
    }
}

impl Serialize for PackageMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, record) in &self.entries {
            map.serialize_entry(id, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PackageMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PackageMapVisitor;

        impl<'de> Visitor<'de> for PackageMapVisitor {
            type Value = PackageMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of package identifiers to package records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PackageMap, A::Error> {
                let mut map = PackageMap::new();
                while let Some((id, record)) =
                    access.next_entry::<String, Option<PackageRecord>>()?
                {
                    map.insert(id, record);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(PackageMapVisitor)
    }
}

/// A manifest-shaped JSON document: an installed manifest or a lock file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<PackageMap>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestDocument {
    pub fn from_packages(packages: PackageMap) -> Self {
        Self {
            locked: Some(packages),
            extra: Map::new(),
        }
    }

    pub fn packages(&self) -> Option<&PackageMap> {
        self.locked.as_ref()
    }
}

/// `input` without a leading UTF-8 byte order mark.
pub fn strip_bom(input: &str) -> &str {
    input.strip_prefix('\u{feff}').unwrap_or(input)
}

/// Parse a document without validating it. A leading byte order mark is
/// ignored.
pub fn parse_manifest_str(input: &str) -> Result<ManifestDocument, ManifestError> {
    let doc: Option<ManifestDocument> = serde_json::from_str(strip_bom(input))?;
    doc.ok_or(ManifestError::Invalid(ValidationError::NullDocument))
}

/// Parse a document and reject it unless it passes [`validate`].
pub fn parse_and_validate(input: &str) -> Result<ManifestDocument, ManifestError> {
    let doc = parse_manifest_str(input)?;
    validate(&doc)?;
    Ok(doc)
}

/// Structural check run before a document is merged or diffed.
///
/// Does not check that versions parse.
pub fn validate(doc: &ManifestDocument) -> Result<(), ValidationError> {
    let packages = doc.locked.as_ref().ok_or(ValidationError::MissingPackageMap)?;
    if packages.is_empty() {
        return Err(ValidationError::EmptyPackageMap);
    }
    for (id, record) in packages.iter() {
        if id.is_blank() {
            return Err(ValidationError::BlankPackageId);
        }
        let record = record.ok_or_else(|| ValidationError::NullRecord(id.to_string()))?;
        if record.version().is_none() {
            return Err(ValidationError::BlankVersion(id.to_string()));
        }
    }
    Ok(())
}

pub fn is_valid(doc: &ManifestDocument) -> bool {
    match validate(doc) {
        Ok(()) => true,
        Err(e) => {
            debug!("document rejected: {e}");
            false
        }
    }
}
