use super::{is_interactive, json_pretty, ProjectEngine, EXIT_FAILURE, EXIT_SUCCESS};
use dialoguer::Confirm;

pub fn run(engine: &ProjectEngine, yes: bool, json: bool) -> Result<u8, String> {
    if !yes && !json && is_interactive() {
        let confirmed = Confirm::new()
            .with_prompt("accept the installed versions and disable every lock file?")
            .default(false)
            .interact()
            .map_err(|e| format!("prompt failed: {e}"))?;
        if !confirmed {
            println!("nothing changed");
            return Ok(EXIT_SUCCESS);
        }
    }

    let report = engine.accept_current().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for path in &report.moved {
            println!("disabled {}", path.display());
        }
        for failed in &report.failed {
            eprintln!("error: could not disable {}: {}", failed.path.display(), failed.reason);
        }
        println!(
            "{} lock file(s) moved to {}",
            report.moved.len(),
            report.disabled_dir.display()
        );
    }
    if report.failed.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILURE)
    }
}
