// Function Dependency Graph
// Arena-backed DAG of pipeline functions with per-vertex string attributes

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Error type for graph operations
#[derive(Debug, Clone)]
pub struct GraphError {
    pub message: String,
    pub kind: GraphErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphErrorKind {
    /// Circular dependency detected
    CyclicDependency,
    /// Reference to a function that is not in the graph
    UnknownVertex,
    /// The same function was added twice
    DuplicateVertex,
    /// The name cannot be used as a directory component
    InvalidName,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph error: {}", self.message)
    }
}

impl std::error::Error for GraphError {}

impl GraphError {
    pub fn cyclic(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: GraphErrorKind::CyclicDependency,
        }
    }

    pub fn unknown_vertex(name: &str) -> Self {
        Self {
            message: format!("unknown function '{}'", name),
            kind: GraphErrorKind::UnknownVertex,
        }
    }

    pub fn invalid_name(name: &str) -> Self {
        Self {
            message: format!("function name '{}' must be a single path component", name),
            kind: GraphErrorKind::InvalidName,
        }
    }

    pub fn duplicate_vertex(name: &str) -> Self {
        Self {
            message: format!("function '{}' is defined more than once", name),
            kind: GraphErrorKind::DuplicateVertex,
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Index of a function in the graph arena
pub type VertexId = usize;

/// Directed acyclic graph of pipeline functions.
///
/// An edge `a -> b` means every job of `a` must finish before any job of `b`
/// starts. Vertices carry free-form string attributes which the group
/// resolver uses to hand group ids from predecessors to successors.
#[derive(Debug, Clone, Default)]
pub struct FunctionGraph {
    /// Function names, indexed by vertex id
    names: Vec<String>,
    /// Quick lookup of vertex id by name
    indices: HashMap<String, VertexId>,
    /// Outgoing edges per vertex
    successors: Vec<Vec<VertexId>>,
    /// Incoming edges per vertex
    predecessors: Vec<Vec<VertexId>>,
    /// Vertex attributes keyed by (vertex, attribute name)
    attributes: HashMap<(VertexId, String), String>,
}

impl FunctionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function vertex.
    ///
    /// Names end up as log directory names, so they must be a single path
    /// component.
    pub fn add_function(&mut self, name: impl Into<String>) -> Result<VertexId, GraphError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(GraphError::invalid_name(&name));
        }
        if self.indices.contains_key(&name) {
            return Err(GraphError::duplicate_vertex(&name));
        }

        let id = self.names.len();
        self.indices.insert(name.clone(), id);
        self.names.push(name);
        self.successors.push(Vec::new());
        self.predecessors.push(Vec::new());
        Ok(id)
    }

    /// Record that `to` depends on `from`. Repeated edges are ignored.
    pub fn add_dependency(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let from_id = self.index_of(from)?;
        let to_id = self.index_of(to)?;

        if !self.successors[from_id].contains(&to_id) {
            self.successors[from_id].push(to_id);
            self.predecessors[to_id].push(from_id);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Function names in insertion order
    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    fn index_of(&self, name: &str) -> Result<VertexId, GraphError> {
        self.indices
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::unknown_vertex(name))
    }

    /// True if the function has no incoming edges
    pub fn is_source_vertex(&self, name: &str) -> Result<bool, GraphError> {
        let id = self.index_of(name)?;
        Ok(self.predecessors[id].is_empty())
    }

    /// Direct upstream functions, in the order their edges were added
    pub fn predecessors(&self, name: &str) -> Result<Vec<&str>, GraphError> {
        let id = self.index_of(name)?;
        Ok(self.predecessors[id]
            .iter()
            .map(|&p| self.names[p].as_str())
            .collect())
    }

    /// Direct downstream functions, in the order their edges were added
    pub fn successors(&self, name: &str) -> Result<Vec<&str>, GraphError> {
        let id = self.index_of(name)?;
        Ok(self.successors[id]
            .iter()
            .map(|&s| self.names[s].as_str())
            .collect())
    }

    /// Functions in dependency order (Kahn's algorithm).
    ///
    /// Among functions that are ready at the same time the lexically smallest
    /// name goes first, so the order is reproducible.
    pub fn topological_sort(&self) -> Result<Vec<String>, GraphError> {
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(Vec::len).collect();

        let mut ready: BTreeSet<(&str, VertexId)> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(id, _)| (self.names[id].as_str(), id))
            .collect();

        let mut order = Vec::with_capacity(self.names.len());

        while let Some((name, id)) = ready.pop_first() {
            order.push(name.to_string());

            for &next in &self.successors[id] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert((self.names[next].as_str(), next));
                }
            }
        }

        if order.len() != self.names.len() {
            let stuck: Vec<&str> = in_degree
                .iter()
                .enumerate()
                .filter(|&(_, &deg)| deg > 0)
                .map(|(id, _)| self.names[id].as_str())
                .collect();
            return Err(GraphError::cyclic(format!(
                "circular dependency detected between functions: {}",
                stuck.join(", ")
            )));
        }

        Ok(order)
    }

    /// Read a vertex attribute. Unknown functions have no attributes.
    pub fn get_vertex_attribute(&self, name: &str, attribute: &str) -> Option<&str> {
        let id = self.indices.get(name)?;
        self.attributes
            .get(&(*id, attribute.to_string()))
            .map(String::as_str)
    }

    pub fn set_vertex_attribute(
        &mut self,
        name: &str,
        attribute: &str,
        value: impl Into<String>,
    ) -> Result<(), GraphError> {
        let id = self.index_of(name)?;
        self.attributes
            .insert((id, attribute.to_string()), value.into());
        Ok(())
    }

    /// Drop an attribute from every vertex
    pub fn clear_attribute(&mut self, attribute: &str) {
        self.attributes.retain(|(_, name), _| name != attribute);
    }

    /// Values of `attribute` recorded on the direct predecessors of `name`.
    ///
    /// Predecessors without the attribute contribute nothing, so the result
    /// may be shorter than the predecessor list or empty.
    pub fn dependencies(&self, name: &str, attribute: &str) -> Result<Vec<String>, GraphError> {
        let id = self.index_of(name)?;
        Ok(self.predecessors[id]
            .iter()
            .filter_map(|&p| self.attributes.get(&(p, attribute.to_string())))
            .cloned()
            .collect())
    }
}
