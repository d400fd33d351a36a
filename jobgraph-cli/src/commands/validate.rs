use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use jobgraph_service::Manifest;

/// Check a manifest without submitting anything
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the pipeline manifest (YAML)
    pub manifest: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let manifest_path = &args.manifest;

    if !manifest_path.exists() {
        color_eyre::eyre::bail!("Manifest file not found: {}", manifest_path.display());
    }

    output::status("Validating", &format!("{}", manifest_path.display()));

    let manifest = match Manifest::from_file(manifest_path) {
        Ok(m) => m,
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    };
    output::check("YAML syntax valid");

    if let Err(e) = manifest.validate() {
        output::error(&e.to_string());
        std::process::exit(1);
    }
    output::check(&format!(
        "Graph: {} functions, {} job definitions, no cycles",
        manifest.functions.len(),
        manifest.total_jobs()
    ));

    let mut bad_cpus = 0;
    for function in &manifest.functions {
        for definition in &function.jobs {
            if let Err(e) = definition.cpu_count() {
                output::error(&format!("{}: {}", function.name, e));
                bad_cpus += 1;
            }
        }
    }
    if bad_cpus > 0 {
        std::process::exit(1);
    }

    let empty: Vec<&str> = manifest
        .functions
        .iter()
        .filter(|f| f.jobs.is_empty())
        .map(|f| f.name.as_str())
        .collect();
    if !empty.is_empty() {
        output::error(&format!(
            "functions without job definitions cannot be grouped: {}",
            empty.join(", ")
        ));
        std::process::exit(1);
    }

    println!();
    output::success("Manifest is valid");

    Ok(())
}
