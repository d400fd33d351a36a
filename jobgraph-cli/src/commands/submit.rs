use crate::output;

use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::Result;

use jobgraph_service::submit::SubmitConfigBuilder;
use jobgraph_service::{DirStaging, Executor, Manifest, SubmitConfig, WrExecutor};

/// Define, save and submit every job of a manifest
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Path to the pipeline manifest (YAML)
    pub manifest: PathBuf,

    /// Submission config file (YAML)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for job logs and the persisted job file
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Prefix for every job's report label
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Engine priority for the submitted jobs
    #[arg(long, value_name = "N")]
    pub priority: Option<u32>,

    /// Log the engine command instead of running it
    #[arg(long, alias = "interactive")]
    pub dry_run: bool,

    /// Batch engine program
    #[arg(long, value_name = "PROGRAM")]
    pub engine: Option<String>,
}

fn load_config(args: &SubmitArgs) -> Result<SubmitConfig> {
    let base = match &args.config {
        Some(path) => SubmitConfig::from_file(path)?,
        None => SubmitConfig::default(),
    };

    let mut builder = SubmitConfigBuilder::from_config(base);
    if let Some(prefix) = &args.prefix {
        builder = builder.job_name_prefix(prefix.clone());
    }
    if let Some(priority) = args.priority {
        builder = builder.priority(priority);
    }
    if let Some(engine) = &args.engine {
        builder = builder.engine_program(engine.clone());
    }
    if args.dry_run {
        builder = builder.interactive(true);
    }
    Ok(builder.build())
}

fn default_staging_dir(run_name: &str) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("jobgraph")
        .join(run_name)
}

fn run_name(manifest: &Manifest, path: &Path) -> String {
    manifest.name.clone().unwrap_or_else(|| {
        path.file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("pipeline")
            .to_string()
    })
}

pub async fn execute(args: SubmitArgs) -> Result<()> {
    let manifest_path = &args.manifest;

    if !manifest_path.exists() {
        color_eyre::eyre::bail!("Manifest file not found: {}", manifest_path.display());
    }

    let config = load_config(&args)?;

    output::status("Parsing", &format!("{}", manifest_path.display()));
    let manifest = Manifest::from_file(manifest_path)?;
    let name = run_name(&manifest, manifest_path);
    let mut graph = manifest.validate()?;
    let definitions = manifest.definitions();

    output::info(&format!(
        "Run '{}': {} functions, {} job definitions",
        name,
        graph.len(),
        manifest.total_jobs()
    ));

    let staging_dir = args
        .staging_dir
        .clone()
        .unwrap_or_else(|| default_staging_dir(&name));
    let staging = DirStaging::new(&staging_dir)?;
    output::status("Staging", &format!("{}", staging.root().display()));

    let mut executor = WrExecutor::new(config);
    let report = match executor.execute(&mut graph, &definitions, &staging).await {
        Ok(report) => report,
        Err(e) => {
            output::failure(&e.to_string());
            return Err(e.into());
        }
    };

    println!();
    output::header(&format!("{} jobs in {} groups", report.jobs, report.groups.len()));
    for group in report.groups.values() {
        output::check(&format!(
            "{}: {} jobs, group {}",
            group.function,
            group.specs.len(),
            group.group_id
        ));
    }
    output::info(&format!("Job file: {}", report.records_path.display()));

    if report.submitted {
        output::success("Jobs submitted");
    } else {
        output::info(&format!("Dry run, not submitted: {}", report.command));
    }

    Ok(())
}
