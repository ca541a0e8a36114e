use crate::diff::Issue;
use lockcheck_schema::{strip_bom, PACKAGE_MAP_FIELD};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to parse manifest: {0}")]
    Parse(serde_json::Error),
    #[error("manifest root is not a JSON object")]
    NotAnObject,
    #[error("'locked' field is missing or not an object")]
    MissingPackageMap,
    #[error("failed to serialize patched manifest: {0}")]
    Serialize(serde_json::Error),
}

/// Apply `issues` to the installed manifest text and return the new text.
///
/// The document is edited as a generic JSON tree, so every field the issues
/// do not name is carried over with its key order intact. An existing record
/// only has its `version` overwritten; a missing package gets a fresh
/// `{"version": .., "dependencies": {}}` record appended to the map.
///
/// Nothing is returned unless every issue applied. Output uses two-space
/// indentation and carries no byte order mark.
pub fn patch_manifest(installed: &str, issues: &[Issue]) -> Result<String, PatchError> {
    let mut root: Value = serde_json::from_str(strip_bom(installed)).map_err(PatchError::Parse)?;
    let packages = root
        .as_object_mut()
        .ok_or(PatchError::NotAnObject)?
        .get_mut(PACKAGE_MAP_FIELD)
        .and_then(Value::as_object_mut)
        .ok_or(PatchError::MissingPackageMap)?;

    for issue in issues {
        apply(packages, issue);
    }

    serde_json::to_string_pretty(&root).map_err(PatchError::Serialize)
}

fn apply(packages: &mut Map<String, Value>, issue: &Issue) {
    let version = Value::String(issue.expected_version.to_string());
    match packages
        .get_mut(issue.package.as_str())
        .and_then(Value::as_object_mut)
    {
        Some(record) => {
            let previous = record
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or("none");
            debug!(
                "{}: version {previous} -> {}",
                issue.package,
                issue.expected_version
            );
            record.insert("version".to_owned(), version);
        }
        None => {
            debug!("{}: adding at {}", issue.package, issue.expected_version);
            packages.insert(
                issue.package.to_string(),
                json!({ "version": version, "dependencies": {} }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTALLED: &str = r#"{
  "dependencies": {
    "com.example.base": { "version": "3.5.0" }
  },
  "locked": {
    "X": { "version": "1.0.0", "dependencies": { "Y": "2.x" }, "url": "https://x" },
    "Y": { "dependencies": { "Z": "1.x" }, "version": "2.0.0", "zz": true }
  }
}"#;

    fn reparse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn overwrites_only_the_version_of_existing_record() {
        let out = patch_manifest(INSTALLED, &[Issue::mismatch("Y", "2.1.0", "2.0.0")]).unwrap();
        let doc = reparse(&out);
        let y = &doc["locked"]["Y"];
        assert_eq!(y["version"], "2.1.0");
        assert_eq!(y["zz"], true);
        let keys: Vec<&String> = y.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["dependencies", "version", "zz"]);
    }

    #[test]
    fn untouched_records_are_reproduced_exactly() {
        let before = patch_manifest(INSTALLED, &[]).unwrap();
        let after = patch_manifest(INSTALLED, &[Issue::mismatch("Y", "2.1.0", "2.0.0")]).unwrap();
        let x_before = serde_json::to_string(&reparse(&before)["locked"]["X"]).unwrap();
        let x_after = serde_json::to_string(&reparse(&after)["locked"]["X"]).unwrap();
        assert_eq!(x_before, x_after);
        assert_eq!(
            x_after,
            r#"{"version":"1.0.0","dependencies":{"Y":"2.x"},"url":"https://x"}"#
        );
        assert_eq!(reparse(&after)["dependencies"], reparse(INSTALLED)["dependencies"]);
    }

    #[test]
    fn inserts_missing_package_with_empty_dependencies() {
        let out = patch_manifest(INSTALLED, &[Issue::missing("B", "0.4.0")]).unwrap();
        let doc = reparse(&out);
        assert_eq!(doc["locked"]["B"], json!({"version": "0.4.0", "dependencies": {}}));
        let keys: Vec<&String> = doc["locked"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["X", "Y", "B"]);
    }

    #[test]
    fn top_level_key_order_is_preserved() {
        let out = patch_manifest(INSTALLED, &[Issue::missing("B", "0.4.0")]).unwrap();
        let doc = reparse(&out);
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["dependencies", "locked"]);
    }

    #[test]
    fn null_record_is_replaced() {
        let out = patch_manifest(
            r#"{"locked": {"A": null}}"#,
            &[Issue::mismatch("A", "1.0.0", "")],
        )
        .unwrap();
        assert_eq!(
            reparse(&out)["locked"]["A"],
            json!({"version": "1.0.0", "dependencies": {}})
        );
    }

    #[test]
    fn record_without_version_gains_one() {
        let out = patch_manifest(
            r#"{"locked": {"A": {"dependencies": {}}}}"#,
            &[Issue::mismatch("A", "1.0.0", "")],
        )
        .unwrap();
        assert_eq!(
            reparse(&out)["locked"]["A"],
            json!({"dependencies": {}, "version": "1.0.0"})
        );
    }

    #[test]
    fn byte_order_mark_is_dropped() {
        let out = patch_manifest(
            "\u{feff}{\"locked\": {\"A\": {\"version\": \"1.0.0\"}}}",
            &[Issue::mismatch("A", "1.1.0", "1.0.0")],
        )
        .unwrap();
        assert!(out.starts_with('{'));
        assert_eq!(reparse(&out)["locked"]["A"]["version"], "1.1.0");
    }

    #[test]
    fn output_is_indented() {
        let out = patch_manifest(r#"{"locked":{"A":{"version":"1.0.0"}}}"#, &[]).unwrap();
        assert_eq!(
            out,
            "{\n  \"locked\": {\n    \"A\": {\n      \"version\": \"1.0.0\"\n    }\n  }\n}"
        );
    }

    #[test]
    fn rejects_unparseable_input() {
        assert!(matches!(
            patch_manifest("{\"locked\":", &[]),
            Err(PatchError::Parse(_))
        ));
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(matches!(
            patch_manifest("[1, 2]", &[Issue::missing("A", "1.0.0")]),
            Err(PatchError::NotAnObject)
        ));
    }

    #[test]
    fn rejects_missing_or_malformed_package_map() {
        for input in [r#"{"dependencies": {}}"#, r#"{"locked": null}"#, r#"{"locked": []}"#] {
            assert!(matches!(
                patch_manifest(input, &[Issue::missing("A", "1.0.0")]),
                Err(PatchError::MissingPackageMap)
            ));
        }
    }
}
