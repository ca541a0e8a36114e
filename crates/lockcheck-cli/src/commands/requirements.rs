use super::{json_pretty, ProjectEngine, EXIT_SUCCESS};

pub fn run(engine: &ProjectEngine, json: bool) -> Result<u8, String> {
    let requirements = engine.requirements().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&requirements)?);
    } else if requirements.is_empty() {
        println!("no requirements declared");
    } else {
        for (package, version) in requirements.iter() {
            println!("{package} {version}");
        }
    }
    Ok(EXIT_SUCCESS)
}
