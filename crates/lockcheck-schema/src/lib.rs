//! Document model, validation, and version ordering for lockcheck.
//!
//! This crate defines the schema layer: JSON manifest parsing
//! (`ManifestDocument`) with document-ordered package maps, structural
//! validation (`validate`), semantic version ordering used when lock files
//! disagree (`is_version_greater`), and the lock document written for a
//! package selection (`LockDocument`).

pub mod lock;
pub mod manifest;
pub mod types;
pub mod version;

pub use lock::{is_lock_file, lock_file_name, LockDocument, LockError, LOCK_FILE_SUFFIX};
pub use manifest::{
    is_valid, parse_and_validate, parse_manifest_str, strip_bom, validate, ManifestDocument,
    ManifestError, PackageMap, PackageRecord, ValidationError, PACKAGE_MAP_FIELD,
};
pub use types::{PackageId, VersionString};
pub use version::{is_version_greater, parse_version, VersionComparer};
