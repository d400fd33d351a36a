mod commands;
mod output;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use commands::plan::PlanArgs;
use commands::submit::SubmitArgs;
use commands::validate::ValidateArgs;

const DEFAULT_FILTER: &str = "jobgraph=info,jobgraph_service=info";
const VERBOSE_FILTER: &str = "jobgraph=debug,jobgraph_service=debug";

#[derive(Parser)]
#[command(name = "jobgraph")]
#[command(about = "Submit a pipeline's function graph to a batch execution engine")]
#[command(version)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Define, save and submit every job of a manifest
    Submit(SubmitArgs),
    /// Show the order functions will be processed in
    Plan(PlanArgs),
    /// Check a manifest without submitting anything
    Validate(ValidateArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Submit(args) => commands::submit::execute(args).await,
        Commands::Plan(args) => commands::plan::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
