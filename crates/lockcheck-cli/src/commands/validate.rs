use super::{json_pretty, ProjectEngine, EXIT_SUCCESS};
use lockcheck_schema::{parse_and_validate, PackageMap};
use lockcheck_store::DocumentStore;
use std::path::Path;

pub fn run(engine: &ProjectEngine, file: &Path, json: bool) -> Result<u8, String> {
    let text = engine
        .store()
        .read_text(file)
        .map_err(|e| format!("store error: {e}"))?
        .ok_or_else(|| format!("required input not found: {}", file.display()))?;
    let doc = parse_and_validate(&text).map_err(|e| format!("manifest error: {e}"))?;
    let count = doc.packages().map_or(0, PackageMap::len);

    if json {
        let payload = serde_json::json!({
            "file": file,
            "valid": true,
            "packages": count,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{} is valid ({count} package(s))", file.display());
    }
    Ok(EXIT_SUCCESS)
}
