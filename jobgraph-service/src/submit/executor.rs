// Submission Executor
// Defines, saves and submits the jobs of a whole function graph

use crate::error::{Phase, PhaseContext, PhaseError, SubmitError};
use crate::graph::FunctionGraph;
use crate::jobs::definition::FunctionDefinitions;
use crate::jobs::group::{GroupResolver, JobGroups};
use crate::jobs::spec::JobSpecBuilder;
use crate::submit::config::SubmitConfig;
use crate::submit::engine::EngineCommand;
use crate::submit::staging::Staging;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::path::PathBuf;
use tracing::info;

/// Outcome of a successful submission
#[derive(Debug, Clone)]
pub struct SubmitReport {
    /// Number of job records persisted
    pub jobs: usize,
    /// Dependency groups, keyed by function
    pub groups: JobGroups,
    /// Where the records were persisted
    pub records_path: PathBuf,
    /// Engine command line, whether or not it was run
    pub command: String,
    /// False in interactive mode
    pub submitted: bool,
}

/// Trait for executor backends
#[async_trait::async_trait]
pub trait Executor: Send {
    /// Turn the graph's job definitions into a submission.
    ///
    /// Any failure aborts the whole attempt and names the phase it came from.
    async fn execute(
        &mut self,
        graph: &mut FunctionGraph,
        definitions: &FunctionDefinitions,
        staging: &dyn Staging,
    ) -> Result<SubmitReport, PhaseError>;
}

/// Executor backend for the `wr` batch engine
pub struct WrExecutor<R = OsRng> {
    config: SubmitConfig,
    builder: JobSpecBuilder,
    rng: R,
}

impl WrExecutor<OsRng> {
    pub fn new(config: SubmitConfig) -> Self {
        Self::with_rng(config, OsRng)
    }
}

impl<R> WrExecutor<R>
where
    R: RngCore + CryptoRng + Send,
{
    /// Use a specific randomness source for group ids
    pub fn with_rng(config: SubmitConfig, rng: R) -> Self {
        Self {
            builder: JobSpecBuilder::from_config(&config),
            config,
            rng,
        }
    }

    pub fn config(&self) -> &SubmitConfig {
        &self.config
    }

    fn define(
        &mut self,
        graph: &mut FunctionGraph,
        definitions: &FunctionDefinitions,
        staging: &dyn Staging,
    ) -> Result<JobGroups, SubmitError> {
        GroupResolver::new(&self.builder, &mut self.rng).resolve(graph, definitions, staging)
    }
}

/// Serialize every spec, function by function in key order
fn flatten_records(groups: &JobGroups) -> Result<Vec<String>, SubmitError> {
    let mut records = Vec::new();
    for group in groups.values() {
        for spec in &group.specs {
            records.push(spec.to_record()?);
        }
    }
    Ok(records)
}

#[async_trait::async_trait]
impl<R> Executor for WrExecutor<R>
where
    R: RngCore + CryptoRng + Send,
{
    async fn execute(
        &mut self,
        graph: &mut FunctionGraph,
        definitions: &FunctionDefinitions,
        staging: &dyn Staging,
    ) -> Result<SubmitReport, PhaseError> {
        info!(functions = graph.len(), "defining jobs");
        let groups = self
            .define(graph, definitions, staging)
            .phase(Phase::Defining)?;

        let records = flatten_records(&groups).phase(Phase::Saving)?;
        let records_path = staging.records_file_path();
        staging.save_records(&records).phase(Phase::Saving)?;
        info!(
            jobs = records.len(),
            path = %records_path.display(),
            "saved job records"
        );

        let command = EngineCommand::add(&self.config, &records_path);
        let submitted = if self.config.interactive {
            info!(command = %command, "interactive mode, not submitting");
            false
        } else {
            info!(command = %command, "submitting jobs");
            command.run().await.phase(Phase::Submitting)?;
            info!(jobs = records.len(), "jobs submitted");
            true
        };

        Ok(SubmitReport {
            jobs: records.len(),
            groups,
            records_path,
            command: command.to_string(),
            submitted,
        })
    }
}
