// Jobgraph Service Library
// Translates a function dependency graph into a grouped batch-engine submission

pub mod error;
pub mod graph;
pub mod jobs;
pub mod submit;

// Re-export commonly used types
pub use error::{Phase, PhaseContext, PhaseError, SubmitError, SubmitResult};

// Re-export graph types
pub use graph::{FunctionGraph, GraphError, GraphErrorKind, Manifest, ManifestError};

// Re-export job types
pub use jobs::{
    BackendJobSpec, Composition, DependencyGroup, FunctionDefinitions, GroupResolver,
    JobDefinition, JobGroups, JobSpecBuilder, ResourceValue,
};

// Re-export submission types
pub use submit::{
    DirStaging, EngineCommand, Executor, Staging, SubmitConfig, SubmitReport, WrExecutor,
};
