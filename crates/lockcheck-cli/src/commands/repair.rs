use super::{json_pretty, spin_fail, spin_ok, spinner, ProjectEngine, EXIT_SUCCESS};
use lockcheck_core::{resolver_from_config, ExternalResolver, Issue, RepairOutcome, ResolverOutcome};

/// Patch the manifest with `issues` and run the configured resolver unless
/// `no_resolve` is set.
pub fn apply(
    engine: &ProjectEngine,
    issues: &[Issue],
    no_resolve: bool,
    json: bool,
) -> Result<RepairOutcome, String> {
    let resolver = if no_resolve {
        None
    } else {
        resolver_from_config(engine.config(), engine.layout().root())
    };

    let pb = if json || issues.is_empty() {
        None
    } else {
        Some(spinner("repairing installed manifest..."))
    };
    let outcome = match engine.repair(issues, resolver.as_ref().map(|r| r as &dyn ExternalResolver)) {
        Ok(o) => o,
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "repair failed");
            }
            return Err(e.to_string());
        }
    };
    if let Some(ref pb) = pb {
        spin_ok(pb, &format!("updated {}", outcome.manifest.display()));
    }

    if !json {
        match &outcome.resolver {
            ResolverOutcome::Triggered { name } => println!("resolver '{name}' finished"),
            ResolverOutcome::Failed { name, reason } => {
                eprintln!("warning: resolver '{name}' failed: {reason}");
            }
            ResolverOutcome::NotConfigured => {
                println!("no resolver configured; run your package resolver to install the new versions");
            }
            ResolverOutcome::Skipped => {}
        }
    }
    Ok(outcome)
}

pub fn run(engine: &ProjectEngine, no_resolve: bool, json: bool) -> Result<u8, String> {
    let report = engine.check().map_err(|e| e.to_string())?;
    let outcome = apply(engine, &report.issues, no_resolve, json)?;
    if json {
        let payload = serde_json::json!({
            "issues": report.issues,
            "repair": outcome,
        });
        println!("{}", json_pretty(&payload)?);
    } else if report.is_clean() {
        println!("installed manifest already satisfies all lock files");
    } else {
        println!("repaired {} package(s)", outcome.patched);
    }
    Ok(EXIT_SUCCESS)
}
