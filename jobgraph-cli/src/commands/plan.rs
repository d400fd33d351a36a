use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use jobgraph_service::Manifest;

/// Show the order functions will be processed in
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the pipeline manifest (YAML)
    pub manifest: PathBuf,
}

pub fn execute(args: PlanArgs) -> Result<()> {
    let manifest = Manifest::from_file(&args.manifest)?;
    let graph = manifest.validate()?;
    let definitions = manifest.definitions();

    output::header(&format!("{} functions", graph.len()));
    for (position, function) in graph.topological_sort()?.iter().enumerate() {
        let jobs = definitions.get(function).map(Vec::as_slice).unwrap_or_default();
        let included = jobs.iter().filter(|d| !d.excluded).count();
        let upstream = graph.predecessors(function)?;

        let after = if upstream.is_empty() {
            "source".to_string()
        } else {
            format!("after {}", upstream.join(", "))
        };
        println!(
            "{:>4}. {} ({} of {} jobs, {})",
            position + 1,
            function,
            included,
            jobs.len(),
            after
        );
    }

    Ok(())
}
