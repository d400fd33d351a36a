// Group Resolver
// Walks the function graph in dependency order and assigns dependency groups

use crate::error::SubmitError;
use crate::graph::FunctionGraph;
use crate::jobs::definition::FunctionDefinitions;
use crate::jobs::spec::{BackendJobSpec, JobSpecBuilder};
use crate::submit::staging::Staging;

use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::{debug, warn};

/// Vertex attribute holding a function's group id
pub const GROUP_ATTRIBUTE: &str = "group_id";

const NONCE_BYTES: usize = 16;

/// All jobs of one function, referenced downstream as a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    pub function: String,
    pub group_id: String,
    /// Group ids of the direct upstream functions
    pub upstream: Vec<String>,
    pub specs: Vec<BackendJobSpec>,
}

/// Dependency groups keyed by function name
pub type JobGroups = BTreeMap<String, DependencyGroup>;

/// `function.run_tag.nonce` with a hex nonce drawn from `rng`
pub fn generate_group_id<R>(function: &str, run_tag: &str, rng: &mut R) -> String
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut nonce = [0u8; NONCE_BYTES];
    rng.fill_bytes(&mut nonce);

    let mut id = format!("{}.{}.", function, run_tag);
    for byte in nonce {
        let _ = write!(id, "{:02x}", byte);
    }
    id
}

/// Assigns a fresh dependency group to every function and builds its jobs
pub struct GroupResolver<'a, R: ?Sized> {
    builder: &'a JobSpecBuilder,
    rng: &'a mut R,
}

impl<'a, R> GroupResolver<'a, R>
where
    R: RngCore + CryptoRng + ?Sized,
{
    pub fn new(builder: &'a JobSpecBuilder, rng: &'a mut R) -> Self {
        Self { builder, rng }
    }

    /// Resolve every function of `graph` in topological order
    pub fn resolve(
        &mut self,
        graph: &mut FunctionGraph,
        definitions: &FunctionDefinitions,
        staging: &dyn Staging,
    ) -> Result<JobGroups, SubmitError> {
        let order = graph.topological_sort()?;
        self.resolve_in_order(graph, &order, definitions, staging)
    }

    /// Resolve functions in the given order.
    ///
    /// Group ids from an earlier attempt are discarded first. A function
    /// visited before its predecessors finds no upstream group and fails.
    pub fn resolve_in_order(
        &mut self,
        graph: &mut FunctionGraph,
        order: &[String],
        definitions: &FunctionDefinitions,
        staging: &dyn Staging,
    ) -> Result<JobGroups, SubmitError> {
        graph.clear_attribute(GROUP_ATTRIBUTE);

        for function in definitions.keys() {
            if !graph.contains(function) {
                warn!(function = %function, "job definitions for a function outside the graph are ignored");
            }
        }

        let mut groups = JobGroups::new();
        for function in order {
            let group = self.resolve_function(graph, function, definitions, staging)?;
            groups.insert(function.clone(), group);
        }
        Ok(groups)
    }

    fn resolve_function(
        &mut self,
        graph: &mut FunctionGraph,
        function: &str,
        definitions: &FunctionDefinitions,
        staging: &dyn Staging,
    ) -> Result<DependencyGroup, SubmitError> {
        let upstream = if graph.is_source_vertex(function)? {
            Vec::new()
        } else {
            let upstream = graph.dependencies(function, GROUP_ATTRIBUTE)?;
            if upstream.is_empty() {
                return Err(SubmitError::StructuralDependency {
                    function: function.to_string(),
                });
            }
            upstream
        };

        let function_definitions = definitions
            .get(function)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let Some(first) = function_definitions.first() else {
            return Err(SubmitError::GroupAssignment {
                function: function.to_string(),
            });
        };

        let group_id = generate_group_id(function, &first.run_tag(), &mut *self.rng);
        let log_dir = staging.log_dir(function)?;

        let specs = function_definitions
            .iter()
            .filter(|definition| !definition.excluded)
            .map(|definition| {
                self.builder
                    .build(definition, function, &log_dir, &upstream, &group_id)
            })
            .collect::<Result<Vec<_>, _>>()?;

        graph.set_vertex_attribute(function, GROUP_ATTRIBUTE, group_id.as_str())?;

        debug!(
            function = %function,
            group_id = %group_id,
            jobs = specs.len(),
            upstream = upstream.len(),
            "resolved dependency group"
        );

        Ok(DependencyGroup {
            function: function.to_string(),
            group_id,
            upstream,
            specs,
        })
    }
}
