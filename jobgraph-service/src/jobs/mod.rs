// Jobs Module
// Job definitions, backend job specs and dependency group resolution

pub mod definition;
pub mod group;
pub mod spec;

pub use definition::{Composition, FunctionDefinitions, JobDefinition, ResourceValue};
pub use group::{generate_group_id, DependencyGroup, GroupResolver, JobGroups, GROUP_ATTRIBUTE};
pub use spec::{wrap_command, BackendJobSpec, JobSpecBuilder, DEFAULT_MEMORY_MB, MEMORY_UNIT};
