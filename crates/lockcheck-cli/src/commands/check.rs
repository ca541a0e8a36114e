use super::{describe_issue, json_pretty, repair, ProjectEngine, EXIT_ISSUES, EXIT_SUCCESS};
use console::Style;

pub fn run(engine: &ProjectEngine, fix: bool, no_resolve: bool, json: bool) -> Result<u8, String> {
    let report = engine.check().map_err(|e| e.to_string())?;

    let repaired = if fix && !report.is_clean() {
        Some(repair::apply(engine, &report.issues, no_resolve, json)?)
    } else {
        None
    };

    if json {
        let payload = serde_json::json!({
            "manifest": report.manifest,
            "lock_files": report.lock_files,
            "skipped": report.skipped,
            "requirements": report.requirements,
            "issues": report.issues,
            "clean": report.is_clean(),
            "repair": repaired,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for skipped in &report.skipped {
            eprintln!(
                "warning: skipped {}: {}",
                skipped.path.display(),
                skipped.reason
            );
        }
        if report.is_clean() {
            println!(
                "{} ({} lock file(s), {} requirement(s))",
                Style::new().green().apply_to("all requirements satisfied"),
                report.lock_files.len(),
                report.requirements.len()
            );
        } else {
            println!("{} issue(s) found:", report.issues.len());
            for issue in &report.issues {
                println!("  {}", describe_issue(issue));
            }
            if repaired.is_none() {
                println!("run `lockcheck repair` to update the installed manifest");
            }
        }
    }

    if report.is_clean() || repaired.is_some() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_ISSUES)
    }
}
