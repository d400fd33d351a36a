// Error Types
// Failure taxonomy for defining, saving and submitting jobs

use crate::graph::GraphError;

use std::fmt;
use thiserror::Error;

/// Errors raised while turning the function graph into submitted jobs.
///
/// None of these are recovered locally: the first one aborts the attempt.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A non-source function has no upstream group id to depend on
    #[error("function '{function}' has no resolvable upstream dependency group")]
    StructuralDependency { function: String },

    /// Processing a function did not produce a usable group id
    #[error("function '{function}' did not yield a dependency group id")]
    GroupAssignment { function: String },

    /// A requested cpu count is not a valid integer
    #[error("invalid cpu count '{value}' for job '{identifier}'")]
    ResourceParse { identifier: String, value: String },

    /// The batch engine exited unsuccessfully
    #[error("batch engine exited with {}", describe_status(.code))]
    Submission { code: Option<i32> },

    /// The batch engine program could not be located
    #[error("batch engine program '{program}' not found: {source}")]
    EngineNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("failed to serialize job record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

pub type SubmitResult<T> = Result<T, SubmitError>;

/// Submission phase an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Defining,
    Saving,
    Submitting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Defining => "defining",
            Phase::Saving => "saving",
            Phase::Submitting => "submitting",
        };
        f.write_str(name)
    }
}

/// A [`SubmitError`] tagged with the phase in which it occurred
#[derive(Debug, Error)]
#[error("Error {phase} jobs: {source}")]
pub struct PhaseError {
    pub phase: Phase,
    #[source]
    pub source: SubmitError,
}

impl PhaseError {
    pub fn new(phase: Phase, source: SubmitError) -> Self {
        Self { phase, source }
    }
}

/// Tags the error side of a result with a submission phase
pub trait PhaseContext<T> {
    fn phase(self, phase: Phase) -> Result<T, PhaseError>;
}

impl<T, E> PhaseContext<T> for Result<T, E>
where
    E: Into<SubmitError>,
{
    fn phase(self, phase: Phase) -> Result<T, PhaseError> {
        self.map_err(|e| PhaseError::new(phase, e.into()))
    }
}
