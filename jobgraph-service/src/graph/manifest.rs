// Pipeline Manifest
// YAML description of functions, their predecessors and their job definitions

use crate::graph::function_graph::{FunctionGraph, GraphError};
use crate::jobs::definition::{FunctionDefinitions, JobDefinition};

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A pipeline run: functions, their ordering constraints and their work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,
    pub functions: Vec<FunctionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub name: String,
    /// Functions that must fully complete before this one starts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
    #[serde(default)]
    pub jobs: Vec<JobDefinition>,
}

impl Manifest {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Build the function graph described by the manifest
    pub fn graph(&self) -> Result<FunctionGraph, GraphError> {
        let mut graph = FunctionGraph::new();
        for function in &self.functions {
            graph.add_function(function.name.as_str())?;
        }
        for function in &self.functions {
            for upstream in &function.after {
                graph.add_dependency(upstream, &function.name)?;
            }
        }
        Ok(graph)
    }

    /// Job definitions keyed by function name
    pub fn definitions(&self) -> FunctionDefinitions {
        self.functions
            .iter()
            .map(|f| (f.name.clone(), f.jobs.clone()))
            .collect()
    }

    /// Build the graph and check it can be ordered
    pub fn validate(&self) -> Result<FunctionGraph, GraphError> {
        let graph = self.graph()?;
        graph.topological_sort()?;
        Ok(graph)
    }

    pub fn total_jobs(&self) -> usize {
        self.functions.iter().map(|f| f.jobs.len()).sum()
    }
}
