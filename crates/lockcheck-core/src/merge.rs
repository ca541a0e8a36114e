use lockcheck_schema::{ManifestDocument, PackageId, VersionComparer, VersionString};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::debug;

/// One winning version per package, in the order packages were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedRequirements {
    entries: Vec<(PackageId, VersionString)>,
    index: HashMap<PackageId, usize>,
}

impl MergedRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, package: &str) -> Option<&VersionString> {
        self.index.get(package).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageId, &VersionString)> {
        self.entries.iter().map(|(p, v)| (p, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offer a requirement. The first offer for a package seeds it; later
    /// offers replace it only when `is_greater(new, current)` holds.
    fn offer<C: VersionComparer>(&mut self, package: &PackageId, version: &str, is_greater: &C) {
        match self.index.get(package) {
            None => {
                self.index.insert(package.clone(), self.entries.len());
                self.entries
                    .push((package.clone(), VersionString::new(version)));
            }
            Some(&i) => {
                let current = &mut self.entries[i].1;
                if is_greater(version, current.as_str()) {
                    debug!("{package}: {version} supersedes {current}");
                    *current = VersionString::new(version);
                }
            }
        }
    }
}

impl Serialize for MergedRequirements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (package, version) in &self.entries {
            map.serialize_entry(package, version)?;
        }
        map.end()
    }
}

/// Collects pairs as-is; a repeated package keeps its first value.
impl<'a> FromIterator<(&'a str, &'a str)> for MergedRequirements {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut merged = MergedRequirements::new();
        for (package, version) in iter {
            merged.offer(&PackageId::from(package), version, &|_: &str, _: &str| false);
        }
        merged
    }
}

/// Fold requirement sets left to right into one version per package,
/// highest version winning.
///
/// Ties, including comparisons the comparer cannot decide, keep the earlier
/// value, so the order of `sets` (and document order within each set) is
/// significant. Records without a version are ignored; callers are expected
/// to pass validated documents.
pub fn merge_requirements<'a, I, C>(sets: I, is_greater: C) -> MergedRequirements
where
    I: IntoIterator<Item = &'a ManifestDocument>,
    C: VersionComparer,
{
    let mut merged = MergedRequirements::new();
    for set in sets {
        let Some(packages) = set.packages() else {
            continue;
        };
        for (package, record) in packages.iter() {
            if let Some(version) = record.and_then(|r| r.version()) {
                merged.offer(package, version, &is_greater);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockcheck_schema::{is_version_greater, parse_and_validate};

    fn set(pairs: &[(&str, &str)]) -> ManifestDocument {
        let body = pairs
            .iter()
            .map(|(p, v)| format!("\"{p}\": {{\"version\": \"{v}\"}}"))
            .collect::<Vec<_>>()
            .join(", ");
        parse_and_validate(&format!("{{\"locked\": {{{body}}}}}")).unwrap()
    }

    #[test]
    fn higher_version_wins() {
        let sets = [set(&[("p", "1.0.0")]), set(&[("p", "2.0.0")])];
        let merged = merge_requirements(&sets, is_version_greater);
        assert_eq!(merged.get("p").unwrap(), "2.0.0");

        let reversed = [set(&[("p", "2.0.0")]), set(&[("p", "1.0.0")])];
        let merged = merge_requirements(&reversed, is_version_greater);
        assert_eq!(merged.get("p").unwrap(), "2.0.0");
    }

    #[test]
    fn ties_keep_first_seen_value() {
        // Semantically equal (build metadata) but spelled differently.
        let sets = [set(&[("p", "1.0.0+a")]), set(&[("p", "1.0.0+b")])];
        let merged = merge_requirements(&sets, is_version_greater);
        assert_eq!(merged.get("p").unwrap(), "1.0.0+a");

        let sets = [set(&[("p", "1.0.0+b")]), set(&[("p", "1.0.0+a")])];
        let merged = merge_requirements(&sets, is_version_greater);
        assert_eq!(merged.get("p").unwrap(), "1.0.0+b");
    }

    #[test]
    fn unparseable_versions_keep_first_seen_value() {
        let sets = [set(&[("p", "banana")]), set(&[("p", "9.9.9")])];
        let merged = merge_requirements(&sets, is_version_greater);
        assert_eq!(merged.get("p").unwrap(), "banana");

        let sets = [set(&[("p", "1.0.0")]), set(&[("p", "banana")])];
        let merged = merge_requirements(&sets, is_version_greater);
        assert_eq!(merged.get("p").unwrap(), "1.0.0");
    }

    #[test]
    fn preserves_first_seen_order_across_sets() {
        let sets = [
            set(&[("b", "1.0.0"), ("a", "1.0.0")]),
            set(&[("c", "1.0.0"), ("a", "2.0.0")]),
        ];
        let merged = merge_requirements(&sets, is_version_greater);
        let order: Vec<&str> = merged.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(order, ["b", "a", "c"]);
        assert_eq!(merged.get("a").unwrap(), "2.0.0");
    }

    #[test]
    fn comparer_is_injected() {
        let sets = [set(&[("p", "2.0.0")]), set(&[("p", "1.0.0")])];
        let always = |_: &str, _: &str| true;
        let merged = merge_requirements(&sets, always);
        assert_eq!(merged.get("p").unwrap(), "1.0.0");
    }

    #[test]
    fn empty_input_yields_empty_requirements() {
        let merged = merge_requirements(&Vec::<ManifestDocument>::new(), is_version_greater);
        assert!(merged.is_empty());
        assert_eq!(merged.len(), 0);
    }

    #[test]
    fn serializes_as_ordered_map() {
        let merged: MergedRequirements = [("z", "1.0.0"), ("a", "2.0.0")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&merged).unwrap(),
            r#"{"z":"1.0.0","a":"2.0.0"}"#
        );
    }

    #[test]
    fn collecting_repeated_package_keeps_first_value() {
        let merged: MergedRequirements = [("p", "2.0.0"), ("q", "1.0.0"), ("p", "1.0.0")]
            .into_iter()
            .collect();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("p").unwrap(), "2.0.0");
        let order: Vec<&str> = merged.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(order, ["p", "q"]);
    }
}
