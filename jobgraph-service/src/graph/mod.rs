// Graph Module
// Function dependency graph and the manifest it is loaded from

pub mod function_graph;
pub mod manifest;

pub use function_graph::{FunctionGraph, GraphError, GraphErrorKind, VertexId};
pub use manifest::{FunctionEntry, Manifest, ManifestError};
