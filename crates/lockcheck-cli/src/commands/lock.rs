use super::{is_interactive, json_pretty, ProjectEngine, EXIT_SUCCESS};
use dialoguer::MultiSelect;
use lockcheck_core::Selection;
use lockcheck_schema::PackageMap;

/// Installed packages offered for a lock file, with their versions, in
/// manifest order. Excluded packages are never offered.
fn candidates(engine: &ProjectEngine, installed: &PackageMap) -> Vec<(String, String)> {
    installed
        .iter()
        .filter(|(id, _)| !engine.config().is_excluded(id))
        .filter_map(|(id, record)| {
            let version = record?.version()?;
            Some((id.to_string(), version.to_owned()))
        })
        .collect()
}

fn prompt_selection(candidates: &[(String, String)]) -> Result<Selection, String> {
    let items: Vec<String> = candidates
        .iter()
        .map(|(id, version)| format!("{id} {version}"))
        .collect();
    let chosen = MultiSelect::new()
        .with_prompt("packages to lock (space to toggle, enter to confirm)")
        .items(&items)
        .interact()
        .map_err(|e| format!("prompt failed: {e}"))?;
    Ok(chosen
        .into_iter()
        .map(|i| (candidates[i].0.as_str(), true))
        .collect())
}

pub fn run(
    engine: &ProjectEngine,
    author: &str,
    asset: &str,
    packages: &[String],
    json: bool,
) -> Result<u8, String> {
    let selection = if packages.is_empty() {
        if !is_interactive() {
            return Err("no --package given and stdin is not a TTY".to_owned());
        }
        let installed = engine.installed_packages().map_err(|e| e.to_string())?;
        let candidates = candidates(engine, &installed);
        if candidates.is_empty() {
            return Err("installed manifest has no packages to lock".to_owned());
        }
        prompt_selection(&candidates)?
    } else {
        packages.iter().map(|p| (p.as_str(), true)).collect()
    };

    let generated = engine
        .generate_lock(author, asset, &selection)
        .map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&generated)?);
    } else {
        println!(
            "wrote {} ({} package(s))",
            generated.path.display(),
            generated.package_count
        );
    }
    Ok(EXIT_SUCCESS)
}
